use std::io::{self, Write};

use super::config::OutputConfig;
use super::types::Envelope;

/// Writes one envelope per line, or indented when `pretty`.
pub struct JsonPresenter { pub pretty: bool }

impl JsonPresenter {
    pub fn emit(&self, env: &Envelope, w: &mut dyn Write) -> io::Result<()> {
        if self.pretty { serde_json::to_writer_pretty(&mut *w, env).map_err(to_io)? } else { serde_json::to_writer(&mut *w, env).map_err(to_io)? }
        writeln!(w)
    }
}

pub struct Emitter {
    presenter: JsonPresenter,
}

impl Emitter {
    pub fn from_config(cfg: OutputConfig) -> Self {
        Emitter { presenter: JsonPresenter { pretty: cfg.pretty } }
    }

    pub fn emit(&self, env: &Envelope) -> io::Result<()> {
        let mut out = io::stdout();
        self.presenter.emit(env, &mut out)?;
        out.flush()
    }
}

fn to_io(e: serde_json::Error) -> io::Error { io::Error::new(io::ErrorKind::Other, e) }
