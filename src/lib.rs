//! # docqa
//!
//! Upload PDF and plain-text documents, index them into a local vector store,
//! and ask questions answered by a hosted language model over the most
//! relevant passages.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────────┐   ┌────────────┐
//! │  Upload  │──▶│ Extract + Chunk  │──▶│   SQLite   │
//! │ .pdf/.txt│   │     + Embed      │   │ vector idx │
//! └──────────┘   └──────────────────┘   └─────┬──────┘
//!                                             │ top-K
//!                                             ▼
//!                 ┌──────────┐          ┌────────────┐
//!                 │   chat   │◀── HTTP ─│ LLM answer │
//!                 │  client  │          └────────────┘
//!                 └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! docqa init                      # create storage directories and index
//! GROQ_API_KEY=... docqa serve    # start the backend
//! docqa chat                      # terminal client
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment secrets |
//! | [`models`] | Core data types and JSON bodies |
//! | [`extract`] | PDF and text extraction |
//! | [`chunk`] | Fixed-size overlapping chunker |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`index`] | SQLite-backed vector index |
//! | [`store`] | Raw document store |
//! | [`ingest`] | Upload-and-index pipeline |
//! | [`retrieval`] | Top-K chunk retrieval |
//! | [`generation`] | LLM answer generation |
//! | [`answer`] | Retrieval-augmented answering |
//! | [`server`] | HTTP backend |
//! | [`auth`] | Client accounts |
//! | [`session`] | Chat transcripts |
//! | [`client`] | HTTP client for the backend |
//! | [`chat`] | Terminal client |

pub mod answer;
pub mod auth;
pub mod chat;
pub mod chunk;
pub mod client;
pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod generation;
pub mod index;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod retrieval;
pub mod server;
pub mod session;
pub mod store;
