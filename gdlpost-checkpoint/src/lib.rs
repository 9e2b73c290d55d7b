// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

mod convert;
mod load;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use convert::to_value;
pub use load::Checkpoint;
