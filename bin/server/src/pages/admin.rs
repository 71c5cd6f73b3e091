//! Admin dashboard, rendered only for authorized administrators.

use crate::types::AdminInfo;
use leptos::prelude::*;

/// Admin dashboard page.
#[component]
pub fn AdminPage(admin: AdminInfo) -> impl IntoView {
    view! {
        <div class="admin-page">
            <AdminHeader display_name=admin.display_name.clone()/>
            <section class="admin-section">
                <h2>"Signed in"</h2>
                <div class="setting-row">
                    <label>"Name"</label>
                    <span>{admin.display_name}</span>
                </div>
                <div class="setting-row">
                    <label>"Email"</label>
                    <span>{admin.email}</span>
                </div>
                <div class="setting-row">
                    <label>"Role"</label>
                    <span>{admin.role}</span>
                </div>
                <div class="setting-row">
                    <label>"Authorized at"</label>
                    <span>{admin.authorized_at.unwrap_or_else(|| "-".to_string())}</span>
                </div>
            </section>
            <section class="admin-section">
                <h2>"Profile"</h2>
                {if admin.profile.is_empty() {
                    view! { <p class="empty-state">"No profile fields."</p> }.into_any()
                } else {
                    view! {
                        <table class="admin-table">
                            <tbody>
                                {admin.profile.into_iter().map(|field| view! {
                                    <tr>
                                        <td>{field.name}</td>
                                        <td>{field.value}</td>
                                    </tr>
                                }).collect_view()}
                            </tbody>
                        </table>
                    }.into_any()
                }}
            </section>
        </div>
    }
}

/// Console header with the signed-in name and a logout link.
#[component]
fn AdminHeader(display_name: String) -> impl IntoView {
    view! {
        <header class="header">
            <div class="header-left">
                <a href="/admin" class="logo">"Ignitus Networks | NEAR Crowdfunding Admin"</a>
            </div>
            <div class="header-right">
                <span class="user-name">{display_name}</span>
                <a href="/auth/logout" rel="external">"Logout"</a>
            </div>
        </header>
    }
}
