//! Shared fixtures for catalog integration tests.
//!
//! [`MockHttp`] stands in for the library websites: it serves canned bodies
//! per URL, counts requests and can fail part-way through a body.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Write;
use std::sync::Mutex;

use flate2::Compression;
use flate2::write::GzEncoder;
use mipdata_core::{Error, HttpClient, Result};

pub const BENCHMARK_URL: &str = "https://miplib.zib.de/tag_benchmark.html";
pub const AIR05_URL: &str = "https://miplib.zib.de/WebData/instances/air05.mps.gz";

pub const AIR05_MPS: &[u8] = b"NAME          air05\nROWS\n N  OBJ\nENDATA\n";

#[derive(Debug, Clone)]
enum Reply {
    Body(Vec<u8>),
    Status(u16),
    /// Write the first bytes of a body, then fail as if the connection dropped.
    Truncated(Vec<u8>),
}

#[derive(Default)]
pub struct MockHttp {
    replies: Mutex<HashMap<String, Reply>>,
    requests: Mutex<Vec<String>>,
}

impl MockHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, url: &str, body: impl Into<Vec<u8>>) {
        self.set(url, Reply::Body(body.into()));
    }

    pub fn fail_with_status(&self, url: &str, status: u16) {
        self.set(url, Reply::Status(status));
    }

    pub fn fail_mid_body(&self, url: &str, partial: impl Into<Vec<u8>>) {
        self.set(url, Reply::Truncated(partial.into()));
    }

    fn set(&self, url: &str, reply: Reply) {
        self.replies.lock().unwrap().insert(url.to_owned(), reply);
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests_for(&self, url: &str) -> usize {
        self.requests.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

impl HttpClient for MockHttp {
    fn fetch(&self, url: &str, sink: &mut dyn Write) -> Result<u64> {
        self.requests.lock().unwrap().push(url.to_owned());
        let reply = self.replies.lock().unwrap().get(url).cloned();
        match reply {
            Some(Reply::Body(body)) => {
                sink.write_all(&body)?;
                Ok(body.len() as u64)
            }
            Some(Reply::Truncated(partial)) => {
                sink.write_all(&partial)?;
                Err(Error::Transport {
                    url: url.to_owned(),
                    source: "connection reset by peer".into(),
                })
            }
            Some(Reply::Status(status)) => Err(Error::HttpStatus {
                url: url.to_owned(),
                status,
            }),
            None => Err(Error::HttpStatus {
                url: url.to_owned(),
                status: 404,
            }),
        }
    }
}

/// One MIPLIB table row: name, status, vars, bins, ints, conts, objective, tags.
pub type Row<'a> = (&'a str, &'a str, u64, u64, u64, u64, &'a str, &'a str);

/// Render a MIPLIB-style instance page with the given rows.
pub fn miplib_page(rows: &[Row<'_>]) -> String {
    let mut html = String::from(
        "<html><body><h1>The Benchmark Set</h1>\n<table>\n<thead><tr>\
         <th>Instance</th><th>Status</th><th>Variables</th><th>Binaries</th>\
         <th>Integers</th><th>Continuous</th><th>Constraints</th><th>Nonz.</th>\
         <th>Submitter</th><th>Group</th><th>Objective</th><th>Tags</th>\
         </tr></thead>\n<tbody>\n",
    );
    for (name, status, vars, bins, ints, conts, objective, tags) in rows {
        html.push_str(&format!(
            "<tr><td><a href=\"instance_details_{name}.html\">{name}</a></td><td>{status}</td>\
             <td>{vars}</td><td>{bins}</td><td>{ints}</td><td>{conts}</td><td>{}</td>\
             <td>{}</td><td>M. Mustermann</td><td></td><td>{objective}</td><td>{tags}</td></tr>\n",
            vars * 2,
            vars * 10,
        ));
    }
    html.push_str("</tbody>\n</table>\n</body></html>\n");
    html
}

/// A small benchmark set covering every problem type.
pub fn benchmark_page() -> String {
    miplib_page(&[
        ("air05", "easy", 7195, 7195, 0, 0, "26374", "benchmark binary set_covering"),
        ("gen-ip002", "easy", 41, 0, 41, 0, "-4783.733392", "benchmark integer"),
        ("neos-3754480-nidda", "open", 253, 50, 0, 203, "12941.7*", "benchmark mixed_binary"),
        ("markshare_4_0", "easy", 34, 30, 0, 4, "1", "benchmark mixed_binary"),
        ("bnatt500", "easy", 4500, 4500, 0, 0, "Infeasible", "benchmark binary infeasible"),
        ("fhnw-binschedule1", "open", 17778, 16822, 0, 956, "-", "benchmark"),
    ])
}

pub fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}
