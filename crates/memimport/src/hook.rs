//! Entry-point symbol name derivation for extension modules.
//!
//! ASCII module names use the `PyInit_<name>` convention. Names with
//! non-ASCII characters use the multi-phase-initialization spelling
//! `PyInitU_<encoded>` where `<encoded>` is the punycode form of the
//! leaf name with `-` replaced by `_`.

const BASE: u64 = 36;
const TMIN: u64 = 1;
const TMAX: u64 = 26;
const SKEW: u64 = 38;
const DAMP: u64 = 700;
const INITIAL_BIAS: u64 = 72;
const INITIAL_N: u64 = 128;

fn adapt(delta: u64, num_points: u64, first_time: bool) -> u64 {
    let mut delta = if first_time { delta / DAMP } else { delta / 2 };
    delta += delta / num_points;
    let mut k = 0;
    while delta > ((BASE - TMIN) * TMAX) / 2 {
        delta /= BASE - TMIN;
        k += BASE;
    }
    k + (((BASE - TMIN + 1) * delta) / (delta + SKEW))
}

fn encode_digit(digit: u64) -> char {
    debug_assert!(digit < BASE);
    if digit < 26 {
        (b'a' + digit as u8) as char
    } else {
        (b'0' + (digit - 26) as u8) as char
    }
}

/// RFC 3492 punycode encoding of `input`. Basic code points are copied
/// through unchanged; extended code points are encoded as lowercase
/// base-36 deltas after the `-` delimiter.
fn punycode_encode(input: &str) -> String {
    let code_points: Vec<u64> = input.chars().map(|ch| ch as u64).collect();
    let mut output: String = input.chars().filter(char::is_ascii).collect();
    let basic_count = output.chars().count() as u64;
    if basic_count > 0 {
        output.push('-');
    }

    let mut handled = basic_count;
    let mut n = INITIAL_N;
    let mut delta: u64 = 0;
    let mut bias = INITIAL_BIAS;
    while (handled as usize) < code_points.len() {
        // Smallest unhandled code point decides the next round.
        let m = code_points
            .iter()
            .copied()
            .filter(|&cp| cp >= n)
            .min()
            .unwrap_or(n);
        delta += (m - n) * (handled + 1);
        n = m;
        for &cp in &code_points {
            if cp < n {
                delta += 1;
            }
            if cp == n {
                let mut q = delta;
                let mut k = BASE;
                loop {
                    let threshold = if k <= bias {
                        TMIN
                    } else if k >= bias + TMAX {
                        TMAX
                    } else {
                        k - bias
                    };
                    if q < threshold {
                        break;
                    }
                    output.push(encode_digit(threshold + (q - threshold) % (BASE - threshold)));
                    q = (q - threshold) / (BASE - threshold);
                    k += BASE;
                }
                output.push(encode_digit(q));
                bias = adapt(delta, handled + 1, handled == basic_count);
                delta = 0;
                handled += 1;
            }
        }
        delta += 1;
        n += 1;
    }
    output
}

/// Derive the initialization entry-point symbol for a dotted module
/// name. Only the last dotted component participates.
pub fn export_hook_name(fullname: &str) -> String {
    let name = fullname.rsplit('.').next().unwrap_or(fullname);
    if name.is_ascii() {
        format!("PyInit_{name}")
    } else {
        format!("PyInitU_{}", punycode_encode(name).replace('-', "_"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_names_use_plain_prefix() {
        assert_eq!(export_hook_name("_socket"), "PyInit__socket");
        assert_eq!(export_hook_name("pkg.sub.helper"), "PyInit_helper");
    }

    #[test]
    fn non_ascii_names_use_punycode_prefix() {
        // "bücher" punycode-encodes to "bcher-kva".
        assert_eq!(export_hook_name("bücher"), "PyInitU_bcher_kva");
        assert_eq!(export_hook_name("pkg.bücher"), "PyInitU_bcher_kva");
    }

    #[test]
    fn punycode_known_vectors() {
        assert_eq!(punycode_encode("bücher"), "bcher-kva");
        assert_eq!(punycode_encode("München"), "Mnchen-3ya");
        // No basic code points: no delimiter is emitted.
        assert_eq!(punycode_encode("ü"), "tda");
    }
}
