use std::collections::HashSet;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("missing field: {0}")]
    MissingField(String),
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Fields consumed from /proc/{pid}/stat
#[derive(Debug, Clone, Copy)]
pub struct ProcStat {
    pub utime: u64,
    pub stime: u64,
    pub num_threads: u64,
}

impl ProcStat {
    pub fn total_ticks(&self) -> u64 {
        self.utime + self.stime
    }
}

/// Parse /proc/{pid}/stat
pub fn parse_proc_stat(content: &str) -> ParseResult<ProcStat> {
    // Format: pid (comm) state ppid ... utime stime ...
    // comm may contain spaces and parentheses
    let end = content
        .rfind(')')
        .ok_or_else(|| ParseError::Parse("no ) found".to_string()))?;
    let after_comm = &content[end + 1..];

    let parts: Vec<&str> = after_comm.split_whitespace().collect();
    if parts.len() < 18 {
        return Err(ParseError::Parse("incomplete proc stat".to_string()));
    }

    let utime = parts[11]
        .parse()
        .map_err(|e| ParseError::Parse(format!("utime: {e}")))?;
    let stime = parts[12]
        .parse()
        .map_err(|e| ParseError::Parse(format!("stime: {e}")))?;
    let num_threads = parts[17]
        .parse()
        .map_err(|e| ParseError::Parse(format!("num_threads: {e}")))?;

    Ok(ProcStat {
        utime,
        stime,
        num_threads,
    })
}

/// Fields consumed from /proc/{pid}/status
#[derive(Debug, Clone, Copy)]
pub struct ProcStatus {
    pub vm_rss_bytes: u64,
    pub voluntary_ctxt_switches: u64,
    pub nonvoluntary_ctxt_switches: u64,
}

/// Parse /proc/{pid}/status
pub fn parse_proc_status(content: &str) -> ParseResult<ProcStatus> {
    let mut vm_rss_kb = None;
    let mut voluntary = None;
    let mut nonvoluntary = None;

    for line in content.lines() {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        match name {
            "VmRSS" => vm_rss_kb = parse_kb(value),
            "voluntary_ctxt_switches" => voluntary = value.trim().parse().ok(),
            "nonvoluntary_ctxt_switches" => nonvoluntary = value.trim().parse().ok(),
            _ => {}
        }
    }

    Ok(ProcStatus {
        vm_rss_bytes: vm_rss_kb
            .ok_or_else(|| ParseError::MissingField("VmRSS".to_string()))?
            * 1024,
        voluntary_ctxt_switches: voluntary
            .ok_or_else(|| ParseError::MissingField("voluntary_ctxt_switches".to_string()))?,
        nonvoluntary_ctxt_switches: nonvoluntary
            .ok_or_else(|| ParseError::MissingField("nonvoluntary_ctxt_switches".to_string()))?,
    })
}

fn parse_kb(value: &str) -> Option<u64> {
    value.trim().trim_end_matches(" kB").trim().parse().ok()
}

/// Inode of a socket fd link target ("socket:[12345]")
pub fn parse_socket_inode(link_target: &str) -> Option<u64> {
    link_target
        .strip_prefix("socket:[")?
        .strip_suffix(']')?
        .parse()
        .ok()
}

/// Socket inodes listed in a /proc/net/{tcp,tcp6,udp,udp6} table
pub fn parse_net_table_inodes(content: &str) -> HashSet<u64> {
    content
        .lines()
        .skip(1) // header
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            parts.get(9)?.parse().ok()
        })
        .collect()
}
