// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Object recycling for types that are created and retired at a high rate.
//!
//! Pools are registered explicitly at startup under a kind name; acquiring from
//! a kind that was never registered is an error, not a panic.

mod recycler;

pub use self::recycler::{ObjectPool, ObjectRecycler, PoolError, Recyclable};
