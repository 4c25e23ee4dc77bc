use std::net::SocketAddr;

use crate::utils::{generate_hex_id, time_us};


const QID_LENGTH: u32 = 8;


/// Per-connection bookkeeping used to correlate log lines.
#[derive(Debug)]
pub struct Context {
    pub qid: String,
    pub peer: Option<SocketAddr>,
    pub start_time_us: u128,
    pub finish_time_us: u128,
}

impl Context {
    pub fn new(peer: Option<SocketAddr>) -> Context {
        Context {
            qid: generate_hex_id(QID_LENGTH),
            peer,
            start_time_us: time_us(),
            finish_time_us: 0,
        }
    }

    pub fn fix(&mut self) {
        self.finish_time_us = time_us();
    }

    pub fn time_ms(&self) -> f32 {
        (self.finish_time_us.saturating_sub(self.start_time_us) as f32) / 1000.0
    }
}
