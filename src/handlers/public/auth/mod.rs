// handlers/public/auth/mod.rs - Public authentication handlers
//
// Token acquisition; no Authorization header required.

pub mod login; // POST /auth/login - authenticate and get JWT

pub use login::login_post;
