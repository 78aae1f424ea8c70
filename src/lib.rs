//! A server-side implementation of NNTP (RFC 3977), the XOVER
//! extension (RFC 2980), and AUTHINFO USER/PASS (RFC 4643): a
//! per-connection protocol engine driving command dispatch, session
//! state, wire parsing/formatting, and atomic multi-newsgroup article
//! ingestion, against an abstract backing store, identity service, and
//! policy service.

pub mod article;
pub mod config;
pub mod conn;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod overview;
pub mod parse;
pub mod policy;
pub mod responses;
pub mod server;
pub mod session;
pub mod store;
pub mod wildmat;
pub mod wire;
