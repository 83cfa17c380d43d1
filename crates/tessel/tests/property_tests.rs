// Dweve Tessel - Grammar-Driven Language Runtime
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Property-based tests of the domain model pipeline.

use proptest::prelude::*;
use tessel::domainmodel::domainmodel;
use tessel::{CancellationToken, DocumentUri, ValidationOptions};

/// Classes `C0..Cn`, each extending an earlier one or nothing.
fn class_chain() -> impl Strategy<Value = Vec<Option<usize>>> {
    prop::collection::vec(any::<Option<prop::sample::Index>>(), 1..10).prop_map(|parents| {
        parents
            .iter()
            .enumerate()
            .map(|(i, parent)| match parent {
                Some(index) if i > 0 => Some(index.index(i)),
                _ => None,
            })
            .collect()
    })
}

fn render(parents: &[Option<usize>]) -> String {
    let mut text = String::from("datatype Int\n");
    for (i, parent) in parents.iter().enumerate() {
        match parent {
            Some(p) => text.push_str(&format!(
                "class C{} extends C{} {{ f{}: Int = {} * 2 }}\n",
                i,
                p,
                i,
                i + 1
            )),
            None => text.push_str(&format!("class C{} {{ }}\n", i)),
        }
    }
    text
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_acyclic_models_are_clean(parents in class_chain()) {
        let services = domainmodel().unwrap();
        let text = render(&parents);
        let analysis = services
            .analyze(
                &DocumentUri::from("file:///gen.dmodel"),
                &text,
                None,
                &ValidationOptions::default(),
                &CancellationToken::new(),
            )
            .unwrap();
        prop_assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);

        let ast = &analysis.parsed.ast;
        let resolved = ast.references().filter(|(_, r)| r.is_resolved()).count();
        let expected = parents.iter().filter(|p| p.is_some()).count() * 2;
        prop_assert_eq!(resolved, expected);
    }

    #[test]
    fn prop_arbitrary_input_never_panics(text in "\\PC{0,100}") {
        let services = domainmodel().unwrap();
        let result = services.analyze(
            &DocumentUri::from("file:///fuzz.dmodel"),
            &text,
            None,
            &ValidationOptions::all_categories(),
            &CancellationToken::new(),
        );
        prop_assert!(result.is_ok());
    }

    #[test]
    fn prop_keyword_soup_never_panics(
        words in prop::collection::vec(
            prop::sample::select(vec![
                "package", "class", "datatype", "extends", "many", "{", "}", ":", "=",
                "+", "*", "/", "(", ")", ".", "A", "b", "1",
            ]),
            0..40,
        )
    ) {
        let services = domainmodel().unwrap();
        let text = words.join(" ");
        let parsed = services.parse(&text);
        let cst = parsed.ast.cst();
        let leaves: String = cst
            .leaves(cst.root())
            .into_iter()
            .filter_map(|id| cst.node(id).image())
            .collect();
        if !parsed.has_errors() {
            prop_assert_eq!(leaves, text);
        }
    }
}
