mod block;
mod chain;
mod fit;
mod header;
mod validity;

pub use block::Block;
pub use chain::{BlockChain, BlockIter};
pub use fit::{Fit, Scan, Selector};
pub use header::{align4, header_size, ALIGNMENT};
pub use validity::Validity;
