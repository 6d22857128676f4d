// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Controllers driving the reconcilers from watch events.

pub mod addon;

pub use addon::AddonController;
