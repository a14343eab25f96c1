//! Domain services used by the HTTP routes and background tasks.
//!
//! ARCHITECTURE
//! ============
//! Service modules own business logic and persistence concerns so route
//! handlers can stay focused on protocol translation and auth plumbing.
//! Every board, note and area query is scoped by the requesting user.

pub mod area;
pub mod auth;
pub mod avatar;
pub mod board;
pub mod note;
pub mod notification;
pub mod overdue;
pub mod profile;
pub mod session;
pub mod validation;
