//! Access code authority - owns the set of codes valid on the current day.

use std::sync::Arc;

use checkpoint_rules::{AccessCode, CodeType, ContentCatalog, FactionId, ValidityWindow, Violation};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info, warn};

/// Reserved emergency code issued when no catalog code is valid.
pub const FALLBACK_CODE: &str = "EMG-0000";

#[derive(Debug, Clone)]
struct DayCodes {
    day: u32,
    codes: Vec<AccessCode>,
}

/// Decides which codes are valid for a day and who may present them.
#[derive(Debug, Clone)]
pub struct AccessCodeAuthority {
    catalog: Arc<ContentCatalog>,
    cache: Option<DayCodes>,
    fallback: AccessCode,
}

impl AccessCodeAuthority {
    /// Create an authority with an empty day cache.
    pub fn new(catalog: Arc<ContentCatalog>) -> Self {
        let mut fallback = AccessCode::new(FALLBACK_CODE, 0, None).with_type(CodeType::Emergency);
        fallback.label = "Reserved emergency clearance".to_string();
        Self {
            catalog,
            cache: None,
            fallback,
        }
    }

    /// Codes that are not revoked and whose window contains `day`.
    ///
    /// Cached per day; a different day recomputes the whole set.
    pub fn valid_codes_for_day(&mut self, day: u32) -> &[AccessCode] {
        let stale = self.cache.as_ref().map_or(true, |cache| cache.day != day);
        if stale {
            let codes: Vec<AccessCode> = self
                .catalog
                .access_codes()
                .iter()
                .filter(|code| code.is_valid_on(day))
                .cloned()
                .collect();
            info!(day, valid = codes.len(), "recomputed valid access codes");
            self.cache = Some(DayCodes { day, codes });
        }
        self.cache
            .as_ref()
            .map(|cache| cache.codes.as_slice())
            .unwrap_or(&[])
    }

    /// Valid codes for the day, or the reserved fallback when there are none.
    pub fn approvable_codes(&mut self, day: u32) -> Vec<AccessCode> {
        let valid = self.valid_codes_for_day(day).to_vec();
        if valid.is_empty() {
            vec![self.issue_fallback()]
        } else {
            valid
        }
    }

    /// Drop the cached day set.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// Day the cache currently holds, if any.
    pub fn cached_day(&self) -> Option<u32> {
        self.cache.as_ref().map(|cache| cache.day)
    }

    /// Empty allowlist means unrestricted.
    pub fn is_authorized_for_faction(&self, code: &AccessCode, faction: &FactionId) -> bool {
        code.is_authorized_for(faction)
    }

    /// The reserved emergency code. Always valid, open to every faction.
    pub fn issue_fallback(&self) -> AccessCode {
        warn!(code = FALLBACK_CODE, "no valid access codes, issuing emergency fallback");
        self.fallback.clone()
    }

    /// Check whether `code` is the reserved emergency code.
    pub fn is_fallback(&self, code: &str) -> bool {
        code == self.fallback.code
    }

    /// Registry record for a code string, including the reserved fallback.
    pub fn lookup(&self, code: &str) -> Option<&AccessCode> {
        if self.is_fallback(code) {
            return Some(&self.fallback);
        }
        self.catalog.get_access_code(code)
    }

    /// Catalog codes exhibiting a window or revocation flaw on `day`.
    ///
    /// Codes with two flaws at once (revoked and expired) are excluded so the
    /// code explains the denial on its own.
    pub fn flawed_codes(&self, violation: Violation, day: u32) -> Vec<&AccessCode> {
        self.catalog
            .access_codes()
            .iter()
            .filter(|code| match violation {
                Violation::RevokedCode => code.revoked && code.window.contains(day),
                Violation::ExpiredCode => !code.revoked && code.window.has_expired_by(day),
                Violation::InactiveCode => !code.revoked && code.window.opens_after(day),
                _ => false,
            })
            .collect()
    }

    /// A code shaped like `base` that is not in the registry.
    pub fn forge_code<R: Rng + ?Sized>(&self, base: &AccessCode, rng: &mut R) -> AccessCode {
        let mut forged = perturb(&base.code, rng);
        for _ in 0..16 {
            if self.lookup(&forged).is_none() {
                break;
            }
            forged = perturb(&base.code, rng);
        }
        if self.lookup(&forged).is_some() {
            forged = format!("{}X", base.code);
        }
        debug!(base = %base.code, forged = %forged, "forged access code");

        let mut code = base.clone();
        code.code = forged;
        code.label = String::new();
        code.window = ValidityWindow::always();
        code.revoked = false;
        code.red_herring = false;
        code.mimics = Some(base.code.clone());
        code
    }
}

/// Swap two digits or bump one, keeping the prefix intact.
fn perturb<R: Rng + ?Sized>(code: &str, rng: &mut R) -> String {
    let (prefix, body) = match code.split_once('-') {
        Some((prefix, body)) => (format!("{prefix}-"), body),
        None => (String::new(), code),
    };
    let mut chars: Vec<char> = body.chars().collect();
    let digits: Vec<usize> = chars
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_ascii_digit())
        .map(|(i, _)| i)
        .collect();

    match digits.as_slice() {
        [] => chars.push('7'),
        [only] => chars[*only] = bump_digit(chars[*only]),
        _ => {
            let mut pair: Vec<usize> = digits.choose_multiple(rng, 2).copied().collect();
            pair.sort_unstable();
            if chars[pair[0]] == chars[pair[1]] {
                chars[pair[1]] = bump_digit(chars[pair[1]]);
            } else {
                chars.swap(pair[0], pair[1]);
            }
        }
    }
    format!("{prefix}{}", chars.into_iter().collect::<String>())
}

fn bump_digit(c: char) -> char {
    let value = c.to_digit(10).unwrap_or(0);
    char::from_digit((value + 1) % 10, 10).unwrap_or('0')
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkpoint_rules::CatalogSources;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn catalog_with_codes(codes: &str) -> Arc<ContentCatalog> {
        let base = r#"
            [[factions]]
            id = "imperium"
            name = "Imperium"
            allowed_code_prefixes = ["IMP"]
            authorized_ship_categories = ["shuttle"]

            [[ship_categories]]
            id = "shuttle"
            name = "Shuttles"

            [[ship_types]]
            id = "lambda"
            name = "Lambda"
            category = "shuttle"

            [[captain_types]]
            id = "officer"
            name = "Officers"
            factions = ["imperium"]
            captains = [{ name = "Vell", rank = "Commander" }]
        "#;
        let sources = CatalogSources::new()
            .with_toml("base", base)
            .with_toml("codes", codes);
        Arc::new(ContentCatalog::load(&sources).unwrap())
    }

    const CODES: &str = r#"
        [[access_codes]]
        code = "IMP-3000"
        valid_from_day = 3
        valid_until_day = -1

        [[access_codes]]
        code = "IMP-0102"
        valid_from_day = 0
        valid_until_day = 2

        [[access_codes]]
        code = "IMP-6666"
        valid_from_day = 0
        revoked = true
        authorized_factions = ["imperium"]
    "#;

    #[test]
    fn test_future_code_window() {
        let mut authority = AccessCodeAuthority::new(catalog_with_codes(CODES));
        let day2: Vec<_> = authority
            .valid_codes_for_day(2)
            .iter()
            .map(|c| c.code.clone())
            .collect();
        assert!(!day2.contains(&"IMP-3000".to_string()));
        assert!(authority.valid_codes_for_day(3).iter().any(|c| c.code == "IMP-3000"));
        assert!(authority.valid_codes_for_day(100).iter().any(|c| c.code == "IMP-3000"));
    }

    #[test]
    fn test_cache_is_stable_within_a_day() {
        let mut authority = AccessCodeAuthority::new(catalog_with_codes(CODES));
        let first = authority.valid_codes_for_day(1).to_vec();
        let second = authority.valid_codes_for_day(1).to_vec();
        assert_eq!(first, second);
        assert_eq!(authority.cached_day(), Some(1));

        authority.valid_codes_for_day(4);
        assert_eq!(authority.cached_day(), Some(4));
    }

    #[test]
    fn test_revoked_never_valid() {
        let mut authority = AccessCodeAuthority::new(catalog_with_codes(CODES));
        for day in 0..10 {
            assert!(authority.valid_codes_for_day(day).iter().all(|c| c.code != "IMP-6666"));
        }
    }

    #[test]
    fn test_fallback_when_nothing_valid() {
        let mut authority = AccessCodeAuthority::new(catalog_with_codes(""));
        assert!(authority.valid_codes_for_day(1).is_empty());
        let codes = authority.approvable_codes(1);
        assert_eq!(codes.len(), 1);
        assert_eq!(codes[0].code, FALLBACK_CODE);
        assert_eq!(codes[0].code_type, CodeType::Emergency);
        assert_eq!(authority.issue_fallback(), authority.issue_fallback());
    }

    #[test]
    fn test_faction_authorization() {
        let authority = AccessCodeAuthority::new(catalog_with_codes(CODES));
        let restricted = authority.lookup("IMP-6666").unwrap();
        assert!(authority.is_authorized_for_faction(restricted, &FactionId::new("imperium")));
        assert!(!authority.is_authorized_for_faction(restricted, &FactionId::new("insurgent")));
        let open = authority.lookup("IMP-3000").unwrap();
        assert!(authority.is_authorized_for_faction(open, &FactionId::new("insurgent")));
    }

    #[test]
    fn test_flawed_codes() {
        let authority = AccessCodeAuthority::new(catalog_with_codes(CODES));
        let expired: Vec<_> = authority
            .flawed_codes(Violation::ExpiredCode, 3)
            .into_iter()
            .map(|c| c.code.as_str())
            .collect();
        assert_eq!(expired, vec!["IMP-0102"]);

        let inactive: Vec<_> = authority
            .flawed_codes(Violation::InactiveCode, 1)
            .into_iter()
            .map(|c| c.code.as_str())
            .collect();
        assert_eq!(inactive, vec!["IMP-3000"]);

        assert_eq!(authority.flawed_codes(Violation::RevokedCode, 1).len(), 1);
        assert!(authority.flawed_codes(Violation::Declared, 1).is_empty());
    }

    #[test]
    fn test_forged_code_is_unregistered_and_keeps_prefix() {
        let authority = AccessCodeAuthority::new(catalog_with_codes(CODES));
        let base = authority.lookup("IMP-3000").unwrap().clone();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..20 {
            let forged = authority.forge_code(&base, &mut rng);
            assert!(authority.lookup(&forged.code).is_none());
            assert_eq!(forged.prefix(), "IMP");
            assert_eq!(forged.mimics.as_deref(), Some("IMP-3000"));
        }
    }
}
