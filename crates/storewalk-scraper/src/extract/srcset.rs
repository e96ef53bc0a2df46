//! `srcset` attribute parsing.

/// One image candidate: its URL and optional width/density descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Candidate<'a> {
    pub url: &'a str,
    pub descriptor: Option<&'a str>,
}

/// Splits a `srcset` value into candidates.
///
/// URLs are whitespace-delimited and may themselves contain commas; a comma
/// only separates candidates when it trails a URL or follows a descriptor.
pub(crate) fn candidates(srcset: &str) -> Vec<Candidate<'_>> {
    let mut out = Vec::new();
    let mut rest = srcset;

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if rest.is_empty() {
            return out;
        }

        let url_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let raw_url = &rest[..url_end];
        rest = &rest[url_end..];

        let url = raw_url.trim_end_matches(',');
        if url.len() != raw_url.len() {
            // "a.jpg, b.jpg 2x": the comma closed this candidate.
            if !url.is_empty() {
                out.push(Candidate {
                    url,
                    descriptor: None,
                });
            }
            continue;
        }

        let descriptor_end = rest.find(',').unwrap_or(rest.len());
        let descriptor = rest[..descriptor_end].trim();
        rest = &rest[descriptor_end..];

        out.push(Candidate {
            url,
            descriptor: (!descriptor.is_empty()).then_some(descriptor),
        });
    }
}

fn is_double_density(descriptor: &str) -> bool {
    descriptor
        .strip_suffix('x')
        .and_then(|d| d.parse::<f64>().ok())
        .is_some_and(|d| (d - 2.0).abs() < f64::EPSILON)
}

/// URL of the first `2x` candidate, or `""` when there is none.
#[must_use]
pub fn large_image_from_srcset(srcset: &str) -> String {
    candidates(srcset)
        .into_iter()
        .find(|c| c.descriptor.is_some_and(is_double_density))
        .map(|c| c.url.to_owned())
        .unwrap_or_default()
}
