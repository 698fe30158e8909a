//! Identifier and path utilities: the handful of pure string functions that
//! every other module in this crate builds namespace paths and per-step meta
//! keys out of. Kept dependency-free and exhaustively unit-tested since
//! every later component trusts these round-trips.

/// Builds the canonical name of a step within its parent document: the
/// parent's own stem, the step's 1-based position, and its step-key.
pub fn step_name(parent_stem: &str, index0: usize, step_key: &str) -> String {
    format!("{parent_stem}__step-{}_{step_key}", index0 + 1)
}

/// Inverse of [`step_name`]. Returns `None` if `s` was not produced by
/// `step_name` (no `__step-` marker, or a non-numeric/zero index).
pub fn parse_step_name(s: &str) -> Option<(String, usize, String)> {
    let (parent_stem, rest) = s.split_once("__step-")?;
    let (index_str, step_key) = rest.split_once('_')?;
    let index1: usize = index_str.parse().ok()?;
    if index1 == 0 {
        return None;
    }
    Some((parent_stem.to_string(), index1 - 1, step_key.to_string()))
}

/// Builds the literal string key under which a step's compiler directives
/// live in `meta.steps`, e.g. `(2, convert)` for the second step, key
/// `convert`.
pub fn meta_step_key(index0: usize, step_key: &str) -> String {
    format!("({}, {step_key})", index0 + 1)
}

/// Inverse of [`meta_step_key`].
pub fn parse_meta_step_key(s: &str) -> Option<(usize, String)> {
    let inner = s.strip_prefix('(')?.strip_suffix(')')?;
    let (index_str, step_key) = inner.split_once(", ")?;
    let index1: usize = index_str.parse().ok()?;
    if index1 == 0 {
        return None;
    }
    Some((index1 - 1, step_key.to_string()))
}

/// Flattens every `/` in `s` into `___`, then reinstates exactly one `/`
/// before the final segment. A string with no `/` is returned unchanged.
/// For a string with exactly one `/`, this is the identity.
pub fn move_slash_last(s: &str) -> String {
    if !s.contains('/') {
        return s.to_string();
    }
    let flattened = s.replace('/', "___");
    let mut parts: Vec<&str> = flattened.split("___").collect();
    let last = parts.pop().expect("flattened string has at least one part");
    format!("{}/{}", parts.join("___"), last)
}

/// The filename-stem portion of a step-key: everything before the last `.`,
/// or the whole string if there is no `.`. Mirrors `Path(step_key).stem` in
/// the original implementation, which is how a step-key (e.g. `convert.yml`)
/// is turned into the stem used for catalog lookups.
pub fn stem_of_step_key(step_key: &str) -> String {
    match step_key.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem.to_string(),
        _ => step_key.to_string(),
    }
}

/// Re-indexes the 1-based positions encoded in `meta.steps` keys: every key
/// `(idx, k)` with `idx >= min_index1` becomes `(idx + shift, k)`. Keys that
/// fail to parse as a meta step key (never expected in practice) pass
/// through unchanged. Used by the structural inliner to keep per-step
/// directives coherent across a splice (spec.md §4.6).
pub fn reindex_meta_steps(
    map: &serde_yaml::Mapping,
    min_index1: usize,
    shift: isize,
) -> serde_yaml::Mapping {
    use serde_yaml::Value;

    let mut out = serde_yaml::Mapping::new();
    for (k, v) in map.iter() {
        match k.as_str().and_then(parse_meta_step_key) {
            Some((idx0, step_key)) => {
                let idx1 = idx0 + 1;
                let new_idx0 = if idx1 >= min_index1 {
                    ((idx0 as isize) + shift).max(0) as usize
                } else {
                    idx0
                };
                out.insert(Value::String(meta_step_key(new_idx0, &step_key)), v.clone());
            }
            None => {
                out.insert(k.clone(), v.clone());
            }
        }
    }
    out
}
