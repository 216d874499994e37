// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::collections::HashSet;
use std::path::PathBuf;

use rand::Rng;

#[allow(dead_code)] // false-positive
pub fn serialization_test_data(name: &str) -> PathBuf {
    const SERDE_TEST_DATA_DIR: &str = "tests/serialization_test_data";

    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join(SERDE_TEST_DATA_DIR)
        .join(name);

    if !path.exists() {
        panic!(
            r#"serialization test data file not found: {}

            Please ensure test data files are present in the repository. Generally, you can
            run the following command from the project root to regenerate the test data files
            if they are missing:

            $ ./tools/generate_serialization_test_data.py
        "#,
            path.display(),
        );
    }

    path
}

/// The keys the fixture files were built from.
#[allow(dead_code)] // false-positive
pub fn fixture_words(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("word-{i}")).collect()
}

/// The non-ASCII keys the `utf8` fixture files were built from.
#[allow(dead_code)] // false-positive
pub fn fixture_utf8_words(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("café-ключ-{i}")).collect()
}

/// Generates `count` distinct random 128-bit hex keys not contained in `exclude`.
#[allow(dead_code)] // false-positive
pub fn random_keys<R: Rng>(rng: &mut R, count: usize, exclude: &HashSet<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(count);
    let mut keys = Vec::with_capacity(count);
    while keys.len() < count {
        let key = format!("{:032x}", rng.random::<u128>());
        if !exclude.contains(&key) && seen.insert(key.clone()) {
            keys.push(key);
        }
    }
    keys
}
