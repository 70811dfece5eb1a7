// handlers/mod.rs - two security tiers
//
// Public (no auth) -> Protected (JWT auth + per-handler capability check)
pub mod public; // /, /health, /auth/login
pub mod protected; // /api/*
