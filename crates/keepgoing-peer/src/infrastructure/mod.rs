//! Infrastructure layer for the peer application.
//!
//! Contains OS-facing adapters and their in-memory stand-ins.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `keepgoing_core`.  The application layer sees it only through the
//! capability traits declared here (`InputSource`, `DisplayEnumerator`) and
//! the ones declared in `application` (`InputSink`, `CursorController`,
//! `Transmitter`).
//!
//! # Sub-modules
//!
//! - **`input_capture`** – The process-wide input listener used while this
//!   machine drives the peer.
//!
//! - **`input_emulation`** – Input injection and pointer warping.
//!
//! - **`network`** – TCP bootstrapping (Host listens, Peer dials) and the
//!   reader/writer relay that turns a byte stream into a `Link`.
//!
//! - **`screen_info`** – Display enumeration, primary display first.
//!
//! - **`storage`** – TOML configuration file persistence.

pub mod input_capture;
pub mod input_emulation;
pub mod network;
pub mod screen_info;
pub mod storage;
