//! Home page component.

use leptos::prelude::*;

/// The home page component.
#[component]
pub fn HomePage() -> impl IntoView {
    view! {
        <div class="home-page">
            <h1>"Ignitus Networks"</h1>
            <p>"NEAR Crowdfunding administration console."</p>
            <a href="/admin" class="cta-button">"Open the dashboard"</a>
        </div>
    }
}
