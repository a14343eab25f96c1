//! Client-side board logic for StickyBoard.
//!
//! This crate holds everything the board page does that is not DOM glue:
//! turning pointer events into move/resize/select outcomes, owning the
//! in-memory notes and areas of the open board, applying the optimistic and
//! confirm-first mutation rules, and polling for new notifications. It has no
//! browser dependency; the host wires events, timers, `fetch` and
//! `sessionStorage` to the traits and state machines defined here.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`input`] | Gesture state machine for dragging and resizing one entity |
//! | [`store`] | Canvas state store and the per-board controller |
//! | [`doc`] | Wire types, patches, selection model and the entity map |
//! | [`gateway`] | Async traits for the board and notification APIs |
//! | [`poll`] | New-notification polling, snack and header refresh |
//! | [`geom`] | Points and rectangles |
//! | [`consts`] | Thresholds, size floors and poll intervals |

pub mod consts;
pub mod doc;
pub mod gateway;
pub mod geom;
pub mod input;
pub mod poll;
pub mod store;
