//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements        | Connects to                    |
//! |-------------|-------------------|--------------------------------|
//! | `event_log` | EventStore        | JSON Lines file / memory       |
//! | `leviton`   | DeviceController  | My Leviton cloud API (HTTPS)   |
//! | `log_sink`  | EventSink         | `log` facade → console + file  |
//! | `telegram`  | Notifier          | Telegram Bot API (HTTPS)       |
//! | `time`      | Clock             | Host local time / manual clock |

pub mod event_log;
pub mod leviton;
pub mod log_sink;
pub mod telegram;
pub mod time;
