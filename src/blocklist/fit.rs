use super::block::Block;
use super::chain::BlockChain;

/// Free-block selection strategy, fixed when the allocator is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Fit {
    /// First free block large enough.
    #[default]
    First,
    /// Free block with the least leftover capacity.
    Best,
    /// Free block with the most leftover capacity.
    Worst,
    /// First fit, resuming after the previously selected block.
    Next,
}

/// Result of one chain scan.
pub struct Scan {
    /// The selected free block, if any qualified.
    pub found: Option<Block>,
    /// The last block visited; on a failed scan this is the chain tail,
    /// which is where growth must append.
    pub last: Option<Block>,
}

/// Runs the configured fit strategy over a chain.
///
/// Holds the resume cursor for next fit; the other strategies are
/// stateless.
pub struct Selector {
    fit: Fit,
    cursor: Option<Block>,
}

impl Selector {
    #[inline(always)]
    pub const fn new(fit: Fit) -> Self {
        Selector { fit, cursor: None }
    }

    #[inline(always)]
    pub fn fit(&self) -> Fit {
        self.fit
    }

    /// Scans `chain` for a free block with at least `size` payload bytes.
    pub fn select(&mut self, chain: &BlockChain, size: usize) -> Scan {
        let scan = match self.fit {
            Fit::First => first_fit(chain, size),
            Fit::Best => extremum_fit(chain, size, |candidate, best| candidate < best),
            Fit::Worst => extremum_fit(chain, size, |candidate, best| candidate > best),
            Fit::Next => next_fit(chain, self.cursor, size),
        };
        if self.fit == Fit::Next {
            if let Some(found) = scan.found {
                self.cursor = Some(found);
            }
        }
        scan
    }

    /// Drops the next-fit cursor if coalescing folded its block away.
    pub fn invalidate(&mut self, chain: &BlockChain) {
        if let Some(cursor) = self.cursor {
            if !chain.contains(cursor) {
                self.cursor = None;
            }
        }
    }
}

fn first_fit(chain: &BlockChain, size: usize) -> Scan {
    let mut last = None;
    for block in chain.iter() {
        if block.is_free() && block.size() >= size {
            return Scan {
                found: Some(block),
                last,
            };
        }
        last = Some(block);
    }
    Scan { found: None, last }
}

/// Best and worst fit share the scan; only the comparison of leftover
/// capacities differs. Ties keep the first-encountered block.
fn extremum_fit(chain: &BlockChain, size: usize, better: impl Fn(usize, usize) -> bool) -> Scan {
    let mut found: Option<(Block, usize)> = None;
    let mut last = None;
    for block in chain.iter() {
        if block.is_free() && block.size() >= size {
            let leftover = block.size() - size;
            match found {
                Some((_, best)) if !better(leftover, best) => {}
                _ => found = Some((block, leftover)),
            }
        }
        last = Some(block);
    }
    Scan {
        found: found.map(|(block, _)| block),
        last,
    }
}

fn next_fit(chain: &BlockChain, cursor: Option<Block>, size: usize) -> Scan {
    let mut last = None;
    // Resume after the previous hit; a tail cursor wraps to the head.
    let resume = cursor.and_then(Block::next);
    let wrapped = resume.is_none();
    let mut node = resume.or_else(|| chain.head());
    while let Some(block) = node {
        if block.is_free() && block.size() >= size {
            return Scan {
                found: Some(block),
                last,
            };
        }
        last = Some(block);
        node = block.next();
    }
    // This pass ran to the chain end, so `last` is now the tail; keep it
    // that way through the wrap so growth appends correctly on failure.
    if !wrapped {
        let mut node = chain.head();
        while let Some(block) = node {
            if block.is_free() && block.size() >= size {
                return Scan {
                    found: Some(block),
                    last,
                };
            }
            if Some(block) == cursor {
                break;
            }
            node = block.next();
        }
    }
    Scan { found: None, last }
}
