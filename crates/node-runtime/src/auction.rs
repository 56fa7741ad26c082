//! # Auction Outcomes
//!
//! Each peer settles one auction outcome: which winner it serves and the
//! payment that winner owes. Two plain-text files carry them:
//!
//! - `winners.txt`: one peer id per line. Line order assigns winner ids, so
//!   the first non-blank line gets winner 1, the second winner 2, and so on.
//! - `payments.txt`: one payment per line, indexed by winner id the same way.
//!
//! Blank lines are skipped. Anything else that does not parse is an error.

use shared_types::NodeId;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuctionError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{file}:{line}: cannot parse '{content}'")]
    InvalidLine {
        file: String,
        line: usize,
        content: String,
    },

    #[error("Peer {peer} is listed as a winner more than once")]
    DuplicateWinner { peer: NodeId },
}

/// Winner and payment assignments for every listed peer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Auction {
    winners: BTreeMap<NodeId, u32>,
    payments: BTreeMap<u32, f64>,
}

impl Auction {
    pub fn load(winners: &Path, payments: &Path) -> Result<Self, AuctionError> {
        let read = |path: &Path| {
            fs::read_to_string(path).map_err(|source| AuctionError::Io {
                path: path.to_path_buf(),
                source,
            })
        };
        let auction = Self::parse(
            &read(winners)?,
            &winners.display().to_string(),
            &read(payments)?,
            &payments.display().to_string(),
        )?;
        tracing::info!(
            winners = auction.winners.len(),
            payments = auction.payments.len(),
            "Auction outcomes loaded"
        );
        Ok(auction)
    }

    /// Parse file contents. `winners_name` and `payments_name` only label
    /// errors.
    pub fn parse(
        winners: &str,
        winners_name: &str,
        payments: &str,
        payments_name: &str,
    ) -> Result<Self, AuctionError> {
        let mut auction = Auction::default();
        for (winner_id, (line, peer)) in (1u32..).zip(entries::<NodeId>(winners, winners_name)?) {
            if auction.winners.insert(peer, winner_id).is_some() {
                tracing::debug!(line, peer, "Repeated winner entry");
                return Err(AuctionError::DuplicateWinner { peer });
            }
        }
        for (winner_id, (_, payment)) in (1u32..).zip(entries::<f64>(payments, payments_name)?) {
            auction.payments.insert(winner_id, payment);
        }
        Ok(auction)
    }

    /// Number of peers listed in the winners file.
    pub fn peer_count(&self) -> usize {
        self.winners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.winners.is_empty()
    }

    /// Winner id and payment for `peer`. Unlisted peers get winner 0, and
    /// winners without a payment line pay 0.
    pub fn assignment(&self, peer: NodeId) -> (u32, f64) {
        let winner_id = self.winners.get(&peer).copied().unwrap_or(0);
        let payment = self.payments.get(&winner_id).copied().unwrap_or(0.0);
        (winner_id, payment)
    }
}

/// Non-blank lines parsed as `T`, with their 1-based line numbers.
fn entries<T: std::str::FromStr>(contents: &str, file: &str) -> Result<Vec<(usize, T)>, AuctionError> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            line.trim()
                .parse()
                .map(|value| (index + 1, value))
                .map_err(|_| AuctionError::InvalidLine {
                    file: file.to_string(),
                    line: index + 1,
                    content: line.to_string(),
                })
        })
        .collect()
}
