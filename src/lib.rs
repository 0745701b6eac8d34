//! # tiny_live_rooms
//!
//! `tiny_live_rooms` is a small Actix-Web backend for managing user accounts,
//! viewing rooms and live-stream URLs on top of a [Pili](https://developer.qiniu.com/pili)-style
//! streaming hub.
//!
//! ## ✅ Features
//!
//! - 👤 Register, update, delete and log in users; each user gets a room on the hub
//! - 🔐 Credential tokens (`base64("name:password")`) re-checked against the store on every request
//! - 🎥 Signed RTMP publish URLs, RTMP/HLS/HDL play URLs and room tokens
//! - 🧹 Daily sweep at 23:59:59 removing accounts older than 30 days
//! - 🚦 Rate limiting with `actix-governor`
//!
//! ## 🔧 Configuration
//!
//! Start the app with the environment file to use:
//!
//! ```bash
//! cargo run -- .env.production
//! ```
//!
//! ### Required values
//!
//! - `PILI_ACCESS_KEY`, `PILI_SECRET_KEY`, `PILI_HUB`
//! - `PILI_PUBLISH_DOMAIN`, `PILI_RTMP_PLAY_DOMAIN`, `PILI_HLS_PLAY_DOMAIN`, `PILI_HDL_PLAY_DOMAIN`
//!
//! ### Optional values
//!
//! - `SERVER_HOST=127.0.0.1`, `SERVER_PORT=6666`
//! - `DATABASE_URL=sqlite://accounts.db?mode=rwc`
//! - `LOG_LEVEL=info`, `LOG_FILE=/var/log/tiny_live_rooms.log`
//! - `PILI_API_HOST=https://pili.qiniuapi.com`
//! - `PUBLISH_URL_TTL=3600`, `ROOM_TOKEN_EXPIRY=3600`, `ROOM_DEFAULT_MAX_USERS=99`
//! - `SWEEP_ON_STARTUP=true` (sweep once right after start, before the first 23:59:59)
//! - `GOVERNOR_BURST=5`, `GOVERNOR_PER_SECOND=2`
//!
//! ## 📚 Modules
//!
//! - [`api`](crate::api) — HTTP routes
//! - [`auth`](crate::auth) — credential token authorizer
//! - [`accounts`](crate::accounts) — user + room operations with compensation
//! - [`sweeper`](crate::sweeper) — expiry sweep and its daily schedule
//! - [`pili`](crate::pili) — hub client, URL and room token signing
//! - [`storage`](crate::storage) — account store (SQLite)
//!
//! ## 📄 License
//!
//! MIT License

pub mod accounts;
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod pili;
pub mod storage;
pub mod sweeper;
pub mod utils;
