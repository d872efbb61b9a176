pub const MAX_CATEGORY_LEN: usize = 50;
pub const MAX_SEARCH_LEN: usize = 100;

/// Raw query string of the listing endpoint, before any validation.
#[derive(Debug, Default)]
pub struct ProductParams {
    pub category: Option<String>,
    pub search: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl ProductParams {
    /// Collects decoded query pairs. A repeated key keeps its first value and
    /// unknown keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = ProductParams::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "category" => &mut params.category,
                "search" => &mut params.search,
                "limit" => &mut params.limit,
                "offset" => &mut params.offset,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        params
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        PageLimits {
            default_limit: 10,
            max_limit: 50,
        }
    }
}

/// A sanitized product listing request.
///
/// Bad input is never rejected. Oversized text filters are dropped and
/// unparsable numbers fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

impl ProductQuery {
    pub fn from_params(params: &ProductParams, limits: PageLimits) -> Self {
        let max_limit = i64::try_from(limits.max_limit.max(1)).unwrap_or(i64::MAX);
        let default_limit = i64::try_from(limits.default_limit).unwrap_or(i64::MAX);
        let limit = parse_int(params.limit.as_deref())
            .unwrap_or(default_limit)
            .clamp(1, max_limit);
        let offset = parse_int(params.offset.as_deref()).unwrap_or(0).max(0);

        ProductQuery {
            category: params.category.as_deref().and_then(sanitize_category),
            search: params.search.as_deref().and_then(sanitize_search),
            limit: usize::try_from(limit).unwrap_or(usize::MAX),
            offset: usize::try_from(offset).unwrap_or(usize::MAX),
        }
    }

    /// Case-insensitive category equality and name/description substring match.
    pub fn matches(&self, category: &str, name: &str, description: Option<&str>) -> bool {
        if let Some(wanted) = &self.category {
            if category.to_lowercase() != *wanted {
                return false;
            }
        }
        if let Some(needle) = &self.search {
            let needle = needle.to_lowercase();
            let in_name = name.to_lowercase().contains(&needle);
            let in_description = description
                .map(|d| d.to_lowercase().contains(&needle))
                .unwrap_or(false);
            if !in_name && !in_description {
                return false;
            }
        }
        true
    }
}

fn sanitize_category(raw: &str) -> Option<String> {
    let category = raw.trim().to_lowercase();
    if category.is_empty() || category.chars().count() > MAX_CATEGORY_LEN {
        return None;
    }
    Some(category)
}

fn sanitize_search(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.chars().count() > MAX_SEARCH_LEN {
        return None;
    }
    let search: String = trimmed.chars().filter(|c| *c != '<' && *c != '>').collect();
    if search.is_empty() {
        return None;
    }
    Some(search)
}

// Leading digits are taken the way a lenient integer parse would ("12abc" -> 12).
fn parse_int(raw: Option<&str>) -> Option<i64> {
    let raw = raw?.trim();
    let (sign, digits) = match raw.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let value: i64 = match digits[..end].parse() {
        Ok(v) => v,
        Err(e) if matches!(e.kind(), std::num::IntErrorKind::PosOverflow) => i64::MAX,
        Err(_) => return None,
    };
    Some(sign * value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> ProductParams {
        let mut p = ProductParams::default();
        for (k, v) in pairs {
            let v = Some(v.to_string());
            match *k {
                "category" => p.category = v,
                "search" => p.search = v,
                "limit" => p.limit = v,
                "offset" => p.offset = v,
                _ => unreachable!(),
            }
        }
        p
    }

    fn query(pairs: &[(&str, &str)]) -> ProductQuery {
        ProductQuery::from_params(&params(pairs), PageLimits::default())
    }

    #[test]
    fn repeated_keys_keep_their_first_value() {
        let pairs = [
            ("category", "clothing"),
            ("search", "shirt"),
            ("limit", "1"),
            ("limit", "2"),
            ("page", "3"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()));
        let params = ProductParams::from_pairs(pairs);
        assert_eq!(params.category.as_deref(), Some("clothing"));
        assert_eq!(params.search.as_deref(), Some("shirt"));
        assert_eq!(params.limit.as_deref(), Some("1"));
        assert_eq!(params.offset, None);
    }

    #[test]
    fn defaults_when_nothing_is_given() {
        let q = query(&[]);
        assert_eq!(
            q,
            ProductQuery {
                category: None,
                search: None,
                limit: 10,
                offset: 0
            }
        );
    }

    #[test]
    fn category_is_trimmed_and_lowercased() {
        assert_eq!(query(&[("category", "  Electronics ")]).category.as_deref(), Some("electronics"));
    }

    #[test]
    fn oversized_category_is_dropped() {
        let long = "a".repeat(51);
        assert_eq!(query(&[("category", &long)]).category, None);
        let exact = "a".repeat(50);
        assert_eq!(query(&[("category", &exact)]).category.as_deref(), Some(exact.as_str()));
    }

    #[test]
    fn search_has_angle_brackets_stripped() {
        let q = query(&[("search", " <script>alert(1)</script> ")]);
        assert_eq!(q.search.as_deref(), Some("scriptalert(1)/script"));
    }

    #[test]
    fn oversized_search_is_dropped() {
        let long = "b".repeat(101);
        assert_eq!(query(&[("search", &long)]).search, None);
        assert_eq!(query(&[("search", "<>")]).search, None);
    }

    #[test]
    fn limit_and_offset_are_clamped() {
        assert_eq!(query(&[("limit", "500")]).limit, 50);
        assert_eq!(query(&[("limit", "0")]).limit, 1);
        assert_eq!(query(&[("limit", "-4")]).limit, 1);
        assert_eq!(query(&[("limit", "abc")]).limit, 10);
        assert_eq!(query(&[("limit", "12abc")]).limit, 12);
        assert_eq!(query(&[("offset", "-3")]).offset, 0);
        assert_eq!(query(&[("offset", "nope")]).offset, 0);
        assert_eq!(query(&[("offset", "7")]).offset, 7);
        assert_eq!(query(&[("limit", "99999999999999999999999")]).limit, 50);
    }

    #[test]
    fn huge_page_limits_do_not_overflow() {
        let limits = PageLimits {
            default_limit: usize::MAX,
            max_limit: usize::MAX,
        };
        let q = ProductQuery::from_params(&ProductParams::default(), limits);
        assert_eq!(q.limit as u64, i64::MAX as u64);

        let q = ProductQuery::from_params(&params(&[("limit", "25")]), limits);
        assert_eq!(q.limit, 25);
    }

    #[test]
    fn filters_are_conjunctive() {
        let q = query(&[("category", "electronics"), ("search", "WATCH")]);
        assert!(q.matches("Electronics", "Smart Watch", None));
        assert!(!q.matches("electronics", "Wireless Headphones", Some("noise cancelling")));
        assert!(!q.matches("clothing", "Watch Strap", None));
    }

    #[test]
    fn search_matches_description() {
        let q = query(&[("search", "noise")]);
        assert!(q.matches("electronics", "Headphones", Some("Active Noise cancellation")));
        assert!(!q.matches("electronics", "Headphones", None));
    }
}
