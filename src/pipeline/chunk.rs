//! Packing of formatted contract lines into size-bounded message blocks.
//!
//! Each block is `title + header + lines... + CLOSER` and never exceeds the
//! limit. Packing is greedy and keeps input order: a block is flushed as
//! soon as the next line would not fit, and a line that could not fit even
//! into an empty block is dropped.

use chrono::{DateTime, Utc};

use crate::models::Contract;

/// Closes the code fence opened by [`CONTRACT_HEADER`].
pub const CLOSER: &str = "```";

/// Column legend written under every section title.
pub const CONTRACT_HEADER: &str = "```\nhash                issued (EVE)      expires (EVE)\n";

/// Section title for contracts not seen in the previous run.
pub const NEW_TITLE: &str = "***New Contracts***\n";

/// Section title for contracts nearing expiry.
pub const EXPIRING_TITLE: &str = "***Expiring Contracts***\n";

/// Hash codes shorter than this get a trailing space to keep columns aligned.
pub const HASH_CODE_WIDTH: usize = 16;

const EVE_TIME_FORMAT: &str = "%m/%d/%y %H:%M";

/// Render a timestamp as EVE time (UTC, 24-hour).
pub fn eve_time(time: DateTime<Utc>) -> String {
    time.format(EVE_TIME_FORMAT).to_string()
}

/// Format one contract as a table row, including the trailing newline.
pub fn format_contract_line(contract: &Contract) -> String {
    let mut hash_code = contract.hash_code().to_string();
    if hash_code.len() < HASH_CODE_WIDTH {
        hash_code.push(' ');
    }
    format!(
        "{}    {}    {}\n",
        hash_code,
        eve_time(contract.issued()),
        eve_time(contract.expires())
    )
}

/// Pack `records` into blocks of at most `limit` bytes.
///
/// Returns an empty vector when `records` is empty. Otherwise at least one
/// block is produced, even if every line was dropped, unless the bare
/// `title + header + CLOSER` frame is itself larger than `limit`.
pub fn chunk<T, F>(title: &str, header: &str, records: &[T], limit: usize, format_line: F) -> Vec<String>
where
    F: Fn(&T) -> String,
{
    if records.is_empty() {
        return Vec::new();
    }

    let frame_len = title.len() + header.len() + CLOSER.len();
    if frame_len > limit {
        log::warn!(
            "Message frame of {} bytes exceeds limit {}; nothing can be sent",
            frame_len,
            limit
        );
        return Vec::new();
    }

    let start_block = || {
        let mut block = String::with_capacity(limit);
        block.push_str(title);
        block.push_str(header);
        block
    };

    let mut blocks = Vec::new();
    let mut block = start_block();
    for record in records {
        let line = format_line(record);

        if frame_len + line.len() > limit {
            log::warn!(
                "Dropping line of {} bytes that cannot fit within {} bytes",
                line.len(),
                limit
            );
            continue;
        }

        if block.len() + line.len() + CLOSER.len() > limit {
            block.push_str(CLOSER);
            blocks.push(block);
            block = start_block();
        }

        block.push_str(&line);
    }

    block.push_str(CLOSER);
    blocks.push(block);
    blocks
}

/// Pack contracts into blocks using the standard table layout.
pub fn chunk_contracts(title: &str, contracts: &[Contract], limit: usize) -> Vec<String> {
    chunk(title, CONTRACT_HEADER, contracts, limit, format_contract_line)
}
