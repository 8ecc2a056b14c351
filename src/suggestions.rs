// ABOUTME: Complementary-item suggestions for shopping lists
// ABOUTME: Static keyword rules, case-insensitive substring matching, deduplicated
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Mercado AI

//! Static suggestion rules mapping list items to common complements.

/// Keyword → complements rule table
const SUGGESTION_RULES: &[(&str, &[&str])] = &[
    ("pasta", &["salsa de tomate", "queso parmesano", "albahaca"]),
    ("cereal", &["leche", "yogurt"]),
    ("pan", &["mantequilla", "mermelada", "jamón"]),
    ("arroz", &["frijoles", "pollo"]),
    ("café", &["azúcar", "leche"]),
    ("té", &["miel", "limón"]),
    ("huevos", &["tocino", "pan"]),
    ("carne", &["especias", "vegetales"]),
    ("pollo", &["arroz", "vegetales"]),
    ("pescado", &["limón", "ajo"]),
    ("ensalada", &["aderezo", "tomate", "pepino"]),
    ("pizza", &["refresco", "cerveza"]),
    ("helado", &["galletas", "frutas"]),
];

/// Suggest complements for the given item names.
///
/// Matches rule keywords as case-insensitive substrings, deduplicates, and
/// never suggests something already on the list.
#[must_use]
pub fn get_suggestions(items: &[String]) -> Vec<String> {
    let existing: Vec<String> = items
        .iter()
        .map(|i| i.to_lowercase().trim().to_owned())
        .collect();

    let mut suggestions: Vec<String> = Vec::new();
    for item in &existing {
        for (keyword, complements) in SUGGESTION_RULES {
            if item.contains(keyword) {
                for complement in *complements {
                    if !suggestions.iter().any(|s| s == complement)
                        && !existing.iter().any(|e| e == complement)
                    {
                        suggestions.push((*complement).to_owned());
                    }
                }
            }
        }
    }

    suggestions
}
