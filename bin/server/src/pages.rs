//! Page components for the application.
//!
//! Each page is a Leptos component that renders a specific route.

pub mod admin;
pub mod home;
pub mod login;
pub mod unauthorized;

pub use admin::AdminPage;
pub use home::HomePage;
pub use login::LoginPage;
pub use unauthorized::UnauthorizedPage;
