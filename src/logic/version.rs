//! Pacman version ordering.
//!
//! Versions are `[epoch:]pkgver[-pkgrel]`. Comparison follows libalpm's
//! `alpm_pkg_vercmp`: epoch first, then pkgver segment by segment, then
//! pkgrel only when both sides carry one. Plain string comparison gets
//! `1.10` vs `1.9` and `1.0rc1` vs `1.0` wrong.

use std::cmp::Ordering;

/// What: Compare two pacman version strings.
///
/// Inputs:
/// - `a`: Left-hand version.
/// - `b`: Right-hand version.
///
/// Output:
/// - `Ordering` of `a` relative to `b`.
///
/// Details:
/// - Missing epoch means `0`
/// - A missing pkgrel on either side makes the pkgrel irrelevant
#[must_use]
pub fn vercmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    let (epoch_a, ver_a, rel_a) = split_evr(a);
    let (epoch_b, ver_b, rel_b) = split_evr(b);

    match rpmvercmp(epoch_a, epoch_b) {
        Ordering::Equal => {}
        ord => return ord,
    }
    match rpmvercmp(ver_a, ver_b) {
        Ordering::Equal => {}
        ord => return ord,
    }
    match (rel_a, rel_b) {
        (Some(ra), Some(rb)) => rpmvercmp(ra, rb),
        _ => Ordering::Equal,
    }
}

/// What: Report whether `candidate` is strictly newer than `installed`.
#[must_use]
pub fn is_newer(candidate: &str, installed: &str) -> bool {
    vercmp(candidate, installed) == Ordering::Greater
}

/// What: Split `[epoch:]version[-release]` into its parts.
///
/// Output:
/// - (`epoch`, `version`, `release`); epoch defaults to `"0"`
///
/// Details:
/// - The epoch is the leading run of digits, only when followed by `:`
/// - The release starts after the last `-` following the epoch
fn split_evr(evr: &str) -> (&str, &str, Option<&str>) {
    let digits = evr.bytes().take_while(u8::is_ascii_digit).count();
    let (epoch, rest) = if evr.as_bytes().get(digits) == Some(&b':') {
        let epoch = &evr[..digits];
        (if epoch.is_empty() { "0" } else { epoch }, &evr[digits + 1..])
    } else {
        ("0", evr)
    };
    match rest.rfind('-') {
        Some(pos) => (epoch, &rest[..pos], Some(&rest[pos + 1..])),
        None => (epoch, rest, None),
    }
}

/// What: Segment-wise comparison of one version component.
///
/// Details:
/// - Runs of non-alphanumerics separate segments; a longer separator wins
/// - Numeric segments beat alpha segments
/// - Numeric segments compare by value (leading zeros ignored)
/// - A trailing alpha segment loses against nothing (`1.0rc1 < 1.0`)
fn rpmvercmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    let a = a.as_bytes();
    let b = b.as_bytes();
    let (mut one, mut two) = (0usize, 0usize);
    let (mut seg_end_a, mut seg_end_b) = (0usize, 0usize);

    while one < a.len() && two < b.len() {
        while one < a.len() && !a[one].is_ascii_alphanumeric() {
            one += 1;
        }
        while two < b.len() && !b[two].is_ascii_alphanumeric() {
            two += 1;
        }
        if one >= a.len() || two >= b.len() {
            break;
        }

        let sep_a = one - seg_end_a;
        let sep_b = two - seg_end_b;
        if sep_a != sep_b {
            return sep_a.cmp(&sep_b);
        }

        let is_num = a[one].is_ascii_digit();
        let class: fn(&u8) -> bool = if is_num {
            u8::is_ascii_digit
        } else {
            u8::is_ascii_alphabetic
        };
        let end_a = one + a[one..].iter().take_while(|c| class(c)).count();
        let end_b = two + b[two..].iter().take_while(|c| class(c)).count();

        // Segments of different type: numeric is newer.
        if end_b == two {
            return if is_num {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }

        let mut seg_a = &a[one..end_a];
        let mut seg_b = &b[two..end_b];
        if is_num {
            seg_a = trim_leading_zeros(seg_a);
            seg_b = trim_leading_zeros(seg_b);
            match seg_a.len().cmp(&seg_b.len()) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        match seg_a.cmp(seg_b) {
            Ordering::Equal => {}
            ord => return ord,
        }

        one = end_a;
        two = end_b;
        seg_end_a = end_a;
        seg_end_b = end_b;
    }

    let rest_a = a.get(one).copied();
    let rest_b = b.get(two).copied();
    match (rest_a, rest_b) {
        (None, None) => Ordering::Equal,
        (None, Some(c)) if !c.is_ascii_alphabetic() => Ordering::Less,
        (Some(c), _) if c.is_ascii_alphabetic() => Ordering::Less,
        _ => Ordering::Greater,
    }
}

/// Strip leading `0` bytes from a numeric segment.
fn trim_leading_zeros(seg: &[u8]) -> &[u8] {
    let zeros = seg.iter().take_while(|c| **c == b'0').count();
    &seg[zeros..]
}
