// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal progress meter for replay

use std::io::Write;

/// `<title>: <pct>% (<n>/<total>)`, redrawn in place whenever the
/// percentage changes
pub struct Progress<W: Write> {
    out: Option<W>,
    title: &'static str,
    total: u64,
    last_percent: Option<u64>,
}

impl<W: Write> Progress<W> {
    pub fn new(out: Option<W>, title: &'static str, total: u64) -> Self {
        Self {
            out,
            title,
            total,
            last_percent: None,
        }
    }

    /// A meter that draws nothing
    pub fn hidden() -> Self {
        Self::new(None, "", 0)
    }

    fn percent(&self, done: u64) -> u64 {
        match self.total {
            0 => 100,
            total => done.min(total) * 100 / total,
        }
    }

    pub fn update(&mut self, done: u64) {
        let percent = self.percent(done);
        if self.last_percent == Some(percent) {
            return;
        }
        self.last_percent = Some(percent);
        if let Some(out) = self.out.as_mut() {
            // Progress output is best-effort
            let _ = write!(
                out,
                "\r{}: {:3}% ({}/{})",
                self.title, percent, done, self.total
            );
            let _ = out.flush();
        }
    }

    pub fn finish(mut self, done: u64) {
        self.last_percent = None;
        self.update(done);
        if let Some(out) = self.out.as_mut() {
            let _ = writeln!(out, ", done.");
        }
    }
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
