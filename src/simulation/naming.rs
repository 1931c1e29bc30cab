//! Syllable-based genus and epithet generator.

use rand::Rng;
use rand::seq::IndexedRandom;

use super::species::Species;

const PREFIXES: &[&str] = &[
    "ab", "acantho", "aero", "amoe", "archa", "bac", "bio", "chloro", "chromo", "cyano", "cyto",
    "dino", "ecto", "endo", "eu", "ferro", "flagel", "geo", "halo", "helio", "hydro", "lipo",
    "macro", "micro", "myxo", "nano", "oxy", "paleo", "photo", "plasmo", "proto", "pseudo",
    "rhizo", "sulfo", "thermo", "vibri", "xeno", "zoo",
];

const COFIXES: &[&str] = &[
    "a", "bacter", "cocc", "cyst", "derm", "fil", "gon", "lith", "loph", "mon", "morph", "nem",
    "phag", "phyl", "plast", "pod", "sphaer", "spir", "stom", "troph",
];

const SUFFIXES: &[&str] = &[
    "a", "ae", "ella", "ens", "ia", "ica", "ida", "inae", "is", "ium", "oides", "on", "opsis",
    "ora", "osa", "um", "us",
];

/// Builds a pronounceable name fragment: prefix, optional cofix, suffix.
pub fn generate_name_section<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut name = String::new();
    name.push_str(PREFIXES.choose(rng).copied().unwrap_or("proto"));
    if rng.random_bool(0.5) {
        name.push_str(COFIXES.choose(rng).copied().unwrap_or("cyst"));
    }
    name.push_str(SUFFIXES.choose(rng).copied().unwrap_or("um"));
    capitalize(&name)
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Whether two species differ in enough part types to be separate genera.
///
/// Counts the symmetric difference of the part type sets, so the result does
/// not depend on argument order.
pub fn is_new_genus(a: &Species, b: &Species, threshold: usize) -> bool {
    let a_types = a.part_types();
    let b_types = b.part_types();
    a_types.symmetric_difference(&b_types).count() >= threshold
}

/// Gives a mutant a name of its own.
///
/// The epithet is always regenerated. The genus is inherited unless the body
/// plans differ by at least `threshold` part types. Identical species keep
/// their name.
pub fn name_new_species<R: Rng + ?Sized>(
    child: &mut Species,
    parent: &Species,
    threshold: usize,
    rng: &mut R,
) {
    if child.fingerprint() == parent.fingerprint() {
        return;
    }

    child.genus = if is_new_genus(child, parent, threshold) {
        generate_name_section(rng)
    } else {
        parent.genus.clone()
    };
    child.epithet = generate_name_section(rng).to_lowercase();
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn names_are_capitalized_and_seeded() {
        let mut a = SmallRng::seed_from_u64(3);
        let mut b = SmallRng::seed_from_u64(3);
        let name = generate_name_section(&mut a);
        assert_eq!(name, generate_name_section(&mut b));
        assert!(name.chars().next().is_some_and(char::is_uppercase));
    }
}
