//! Chain state management
//!
//! Blocks are kept in buckets indexed by height. A bucket with more than one
//! block is a fork; the first block in a bucket is the primary one.

use super::errors::{LedgerError, Result};
use shared_types::{Block, NodeId};
use std::fmt;
use tracing::{debug, trace};

/// Largest jump above the current top accepted by [`Blockchain::add_block`].
pub const MAX_HEIGHT_GAP: u64 = 10_000;

static GENESIS: Block = Block::GENESIS;

/// What [`Blockchain::ingest`] did with a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Stored in the main chain; `adopted` orphans followed it in.
    Appended { adopted: usize },
    /// Parent unknown, parked in the orphan pool.
    Orphaned,
    /// Already known, nothing changed.
    Duplicate,
}

/// Height-bucketed chain plus orphan pool.
#[derive(Debug, Clone)]
pub struct Blockchain {
    blocks: Vec<Vec<Block>>,
    orphans: Vec<Block>,
    total_blocks: u64,
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

impl Blockchain {
    /// A chain holding only the genesis block.
    pub fn new() -> Self {
        Self {
            blocks: vec![vec![Block::genesis()]],
            orphans: Vec::new(),
            total_blocks: 1,
        }
    }

    fn bucket(&self, height: u64) -> Option<&Vec<Block>> {
        usize::try_from(height).ok().and_then(|h| self.blocks.get(h))
    }

    /// Height of the highest bucket.
    pub fn blockchain_height(&self) -> u64 {
        self.blocks.len().saturating_sub(1) as u64
    }

    /// Blocks ever appended to the main store, genesis included.
    pub fn total_blocks(&self) -> u64 {
        self.total_blocks
    }

    /// Every block stored at `height`, primary first.
    pub fn blocks_at(&self, height: u64) -> &[Block] {
        self.bucket(height).map_or(&[], Vec::as_slice)
    }

    /// First block of the highest bucket.
    pub fn current_top_block(&self) -> &Block {
        self.blocks
            .last()
            .and_then(|bucket| bucket.first())
            .unwrap_or(&GENESIS)
    }

    pub fn has_block(&self, block: &Block) -> bool {
        self.bucket(block.height)
            .is_some_and(|bucket| bucket.contains(block))
    }

    pub fn has_block_at(&self, height: u64, miner_id: NodeId) -> bool {
        self.bucket(height)
            .is_some_and(|bucket| bucket.iter().any(|b| b.miner_id == miner_id))
    }

    /// Look in the main store, then in the orphan pool.
    pub fn return_block(&self, height: u64, miner_id: NodeId) -> Option<&Block> {
        self.bucket(height)
            .and_then(|bucket| bucket.iter().find(|b| b.miner_id == miner_id))
            .or_else(|| {
                self.orphans
                    .iter()
                    .find(|b| b.height == height && b.miner_id == miner_id)
            })
    }

    pub fn get_parent(&self, block: &Block) -> Option<&Block> {
        if block.height == 0 {
            return None;
        }
        self.bucket(block.height - 1)?
            .iter()
            .find(|candidate| candidate.is_parent(block))
    }

    pub fn get_children(&self, block: &Block) -> Vec<&Block> {
        self.bucket(block.height + 1)
            .map(|bucket| bucket.iter().filter(|c| c.is_child(block)).collect())
            .unwrap_or_default()
    }

    /// Append `block` to the bucket at its height, creating empty buckets for
    /// any heights skipped.
    pub fn add_block(&mut self, block: Block) -> Result<()> {
        if block.height == 0 {
            return Err(LedgerError::GenesisReserved {
                miner_id: block.miner_id,
            });
        }
        let top = self.blockchain_height();
        if block.height > top.saturating_add(MAX_HEIGHT_GAP) {
            return Err(LedgerError::HeightGap {
                height: block.height,
                top,
            });
        }

        let height = usize::try_from(block.height).map_err(|_| LedgerError::HeightGap {
            height: block.height,
            top,
        })?;
        if self.blocks.len() <= height {
            self.blocks.resize_with(height + 1, Vec::new);
        }

        debug!(height = block.height, miner = block.miner_id, parent = block.parent_miner_id, "Block appended");
        self.blocks[height].push(block);
        self.total_blocks += 1;
        Ok(())
    }

    // =========================================================================
    // Orphans
    // =========================================================================

    /// Park a block whose parent is unknown. Returns `false` if it was
    /// already parked.
    pub fn add_orphan(&mut self, block: Block) -> bool {
        if self.is_orphan(&block) {
            return false;
        }
        trace!(height = block.height, miner = block.miner_id, "Orphan parked");
        self.orphans.push(block);
        true
    }

    /// Returns `false` if `block` was not an orphan.
    pub fn remove_orphan(&mut self, block: &Block) -> bool {
        match self.orphans.iter().position(|o| o == block) {
            Some(index) => {
                self.orphans.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn is_orphan(&self, block: &Block) -> bool {
        self.orphans.contains(block)
    }

    pub fn orphan_count(&self) -> usize {
        self.orphans.len()
    }

    pub fn orphans(&self) -> &[Block] {
        &self.orphans
    }

    /// Move every orphan whose parent is now in the main store into it,
    /// repeating until no more qualify. Returns how many moved.
    pub fn adopt_orphans(&mut self) -> usize {
        let mut adopted = 0;
        while let Some(index) = self
            .orphans
            .iter()
            .position(|orphan| self.get_parent(orphan).is_some())
        {
            let block = self.orphans.remove(index);
            if self.has_block(&block) {
                continue;
            }
            if self.add_block(block).is_ok() {
                adopted += 1;
            }
        }
        if adopted > 0 {
            debug!(adopted, remaining = self.orphans.len(), "Orphans adopted");
        }
        adopted
    }

    /// Store a received block wherever it belongs.
    pub fn ingest(&mut self, block: Block) -> Result<IngestOutcome> {
        if self.has_block(&block) || self.is_orphan(&block) {
            return Ok(IngestOutcome::Duplicate);
        }
        if self.get_parent(&block).is_some() {
            self.add_block(block)?;
            let adopted = self.adopt_orphans();
            return Ok(IngestOutcome::Appended { adopted });
        }
        if block.height == 0 {
            return Err(LedgerError::GenesisReserved {
                miner_id: block.miner_id,
            });
        }
        self.add_orphan(block);
        Ok(IngestOutcome::Orphaned)
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    /// Blocks beyond the first at each height.
    pub fn blocks_in_forks(&self) -> usize {
        self.blocks
            .iter()
            .map(|bucket| bucket.len().saturating_sub(1))
            .sum()
    }
}

impl fmt::Display for Blockchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Blockchain height={} total_blocks={} forks={} orphans={}",
            self.blockchain_height(),
            self.total_blocks,
            self.blocks_in_forks(),
            self.orphans.len()
        )?;
        for (height, bucket) in self.blocks.iter().enumerate() {
            write!(f, "  [{height}]")?;
            if bucket.is_empty() {
                write!(f, " (empty)")?;
            }
            for block in bucket {
                write!(f, " miner={} parent={} txs={};", block.miner_id, block.parent_miner_id, block.transactions.len())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn block(height: u64, miner: NodeId, parent: NodeId) -> Block {
        Block::new(height, miner, parent, height * 1_000)
    }

    #[test]
    fn test_new_chain_holds_genesis() {
        let chain = Blockchain::new();
        assert_eq!(chain.blockchain_height(), 0);
        assert_eq!(chain.total_blocks(), 1);
        assert_eq!(chain.blocks_at(0).len(), 1);
        assert!(chain.current_top_block().is_genesis());
        assert_eq!(chain.current_top_block().miner_id, 0);
    }

    #[test]
    fn test_genesis_height_is_reserved() {
        let mut chain = Blockchain::new();
        assert_eq!(
            chain.add_block(block(0, 3, 0)),
            Err(LedgerError::GenesisReserved { miner_id: 3 })
        );
        assert_eq!(chain.blocks_at(0).len(), 1);
    }

    #[test]
    fn test_append_advances_height() {
        let mut chain = Blockchain::new();
        chain.add_block(block(1, 0, 0)).unwrap();
        chain.add_block(block(2, 0, 0)).unwrap();

        assert_eq!(chain.blockchain_height(), 2);
        assert_eq!(chain.total_blocks(), 3);
        assert_eq!(*chain.current_top_block(), block(2, 0, 0));
    }

    #[test]
    fn test_skipped_heights_get_empty_buckets() {
        let mut chain = Blockchain::new();
        chain.add_block(block(5, 1, 1)).unwrap();

        assert_eq!(chain.blockchain_height(), 5);
        assert!((1..5).all(|h| chain.blocks_at(h).is_empty()));
        assert_eq!(chain.current_top_block().height, 5);
    }

    #[test]
    fn test_huge_gap_rejected() {
        let mut chain = Blockchain::new();
        let result = chain.add_block(block(MAX_HEIGHT_GAP + 1, 0, 0));
        assert!(matches!(result, Err(LedgerError::HeightGap { .. })));
        assert_eq!(chain.blockchain_height(), 0);
    }

    #[test]
    fn test_lookups_beyond_height_are_empty() {
        let chain = Blockchain::new();
        assert!(!chain.has_block(&block(3, 0, 0)));
        assert!(!chain.has_block_at(3, 0));
        assert!(chain.get_children(&Block::genesis()).is_empty());
        assert!(chain.get_parent(&block(9, 0, 0)).is_none());
        assert!(chain.return_block(7, 0).is_none());
        assert!(chain.blocks_at(42).is_empty());
    }

    #[test]
    fn test_parent_and_children() {
        let mut chain = Blockchain::new();
        let b1 = block(1, 0, 0);
        let b2a = block(2, 4, 0);
        let b2b = block(2, 5, 0);
        let stray = block(2, 6, 9);
        for b in [b1.clone(), b2a.clone(), b2b.clone(), stray.clone()] {
            chain.add_block(b).unwrap();
        }

        assert_eq!(chain.get_parent(&b2a), Some(&b1));
        assert_eq!(chain.get_parent(&b2b), Some(&b1));
        assert_eq!(chain.get_parent(&stray), None);
        assert_eq!(chain.get_children(&b1), vec![&b2a, &b2b]);
        assert_eq!(chain.get_parent(&b1), Some(&Block::genesis()));
        assert_eq!(chain.get_parent(&Block::genesis()), None);
    }

    #[test]
    fn test_forks_keep_first_block_as_top() {
        let mut chain = Blockchain::new();
        chain.add_block(block(1, 1, 0)).unwrap();
        chain.add_block(block(1, 2, 0)).unwrap();
        chain.add_block(block(1, 3, 0)).unwrap();

        assert_eq!(chain.blockchain_height(), 1);
        assert_eq!(chain.current_top_block().miner_id, 1);
        assert_eq!(chain.blocks_in_forks(), 2);
        assert!(chain.has_block_at(1, 3));
    }

    #[test]
    fn test_return_block_falls_back_to_orphans() {
        let mut chain = Blockchain::new();
        chain.add_block(block(1, 0, 0)).unwrap();
        let orphan = block(4, 7, 7);
        assert!(chain.add_orphan(orphan.clone()));
        assert!(!chain.add_orphan(orphan.clone()));

        assert_eq!(chain.return_block(1, 0), Some(&block(1, 0, 0)));
        assert_eq!(chain.return_block(4, 7), Some(&orphan));
        assert_eq!(chain.return_block(4, 8), None);
    }

    #[test]
    fn test_orphan_bookkeeping() {
        let mut chain = Blockchain::new();
        let orphan = block(3, 2, 1);
        chain.add_orphan(orphan.clone());
        assert!(chain.is_orphan(&orphan));
        assert_eq!(chain.orphan_count(), 1);

        assert!(chain.remove_orphan(&orphan));
        assert!(!chain.remove_orphan(&orphan));
        assert_eq!(chain.orphan_count(), 0);
    }

    #[test]
    fn test_adopt_orphans_in_chain() {
        let mut chain = Blockchain::new();
        chain.add_orphan(block(3, 0, 0));
        chain.add_orphan(block(2, 0, 0));
        assert_eq!(chain.adopt_orphans(), 0);

        chain.add_block(block(1, 0, 0)).unwrap();
        assert_eq!(chain.adopt_orphans(), 2);
        assert_eq!(chain.blockchain_height(), 3);
        assert_eq!(chain.orphan_count(), 0);
    }

    #[test]
    fn test_ingest_outcomes() {
        let mut chain = Blockchain::new();
        assert_eq!(chain.ingest(block(2, 0, 0)), Ok(IngestOutcome::Orphaned));
        assert_eq!(chain.ingest(block(2, 0, 0)), Ok(IngestOutcome::Duplicate));
        assert_eq!(chain.ingest(block(1, 0, 0)), Ok(IngestOutcome::Appended { adopted: 1 }));
        assert_eq!(chain.ingest(block(1, 0, 0)), Ok(IngestOutcome::Duplicate));
        assert_eq!(chain.ingest(Block::genesis()), Ok(IngestOutcome::Duplicate));
        assert_eq!(chain.blockchain_height(), 2);
    }

    #[test]
    fn test_display_lists_every_height() {
        let mut chain = Blockchain::new();
        chain.add_block(block(2, 0, 0)).unwrap();
        let printed = chain.to_string();
        assert!(printed.starts_with("Blockchain height=2"));
        assert!(printed.contains("[1] (empty)"));
        assert!(printed.contains("[2] miner=0 parent=0"));
    }

    proptest! {
        #[test]
        fn prop_height_is_max_appended(heights in proptest::collection::vec(1u64..200, 1..40)) {
            let mut chain = Blockchain::new();
            for (i, &h) in heights.iter().enumerate() {
                chain.add_block(block(h, i as NodeId, 0)).unwrap();
            }
            let max = *heights.iter().max().unwrap();
            prop_assert_eq!(chain.blockchain_height(), max);
            prop_assert_eq!(chain.total_blocks(), heights.len() as u64 + 1);
            prop_assert_eq!(chain.current_top_block().height, max);
            prop_assert_eq!(chain.blocks_at(0).len(), 1);
        }

        #[test]
        fn prop_parent_child_symmetry(h in 1u64..50, parent_miner in 0u32..5, child_miner in 0u32..5) {
            let mut chain = Blockchain::new();
            let parent = block(h, parent_miner, 0);
            let child = block(h + 1, child_miner, parent_miner);
            chain.add_block(parent.clone()).unwrap();
            chain.add_block(child.clone()).unwrap();

            prop_assert!(chain.get_children(&parent).contains(&&child));
            prop_assert_eq!(chain.get_parent(&child), Some(&parent));
        }
    }
}
