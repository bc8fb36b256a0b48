// SPDX-License-Identifier: MIT
pub mod header;
pub mod properties;
pub mod source;
