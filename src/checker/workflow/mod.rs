// SPDX-License-Identifier: MIT

pub mod engine;
pub mod nodes;
pub mod retry;
pub mod router;
pub mod state;
