use rand::Rng;

/// Keys physically next to `c` on a US QWERTY layout, lowercase.
pub fn qwerty_neighbors(c: char) -> Option<&'static [char]> {
    let neighbors: &'static [char] = match c.to_ascii_lowercase() {
        'a' => &['q', 'w', 's', 'z', 'x'],
        'b' => &['v', 'g', 'h', 'n'],
        'c' => &['x', 'd', 'f', 'v'],
        'd' => &['s', 'e', 'r', 'f', 'c', 'x'],
        'e' => &['w', 's', 'd', 'r'],
        'f' => &['d', 'r', 't', 'g', 'v', 'c'],
        'g' => &['f', 't', 'y', 'h', 'b', 'v'],
        'h' => &['g', 'y', 'u', 'j', 'n', 'b'],
        'i' => &['u', 'j', 'k', 'o'],
        'j' => &['h', 'u', 'i', 'k', 'm', 'n'],
        'k' => &['j', 'i', 'o', 'l', ',', 'm'],
        'l' => &['k', 'o', 'p', ';', '.'],
        'm' => &['n', 'j', 'k', ','],
        'n' => &['b', 'h', 'j', 'm'],
        'o' => &['i', 'k', 'l', 'p'],
        'p' => &['o', 'l', '['],
        'q' => &['w', 'a'],
        'r' => &['e', 'd', 'f', 't'],
        's' => &['a', 'w', 'e', 'd', 'x', 'z'],
        't' => &['r', 'f', 'g', 'y'],
        'u' => &['y', 'h', 'j', 'i'],
        'v' => &['c', 'f', 'g', 'b'],
        'w' => &['q', 'a', 's', 'e'],
        'x' => &['z', 's', 'd', 'c'],
        'y' => &['t', 'g', 'h', 'u'],
        'z' => &['a', 's', 'x'],
        '1' => &['2', 'q'],
        '2' => &['1', '3', 'q', 'w'],
        '3' => &['2', '4', 'w', 'e'],
        '4' => &['3', '5', 'e', 'r'],
        '5' => &['4', '6', 'r', 't'],
        '6' => &['5', '7', 't', 'y'],
        '7' => &['6', '8', 'y', 'u'],
        '8' => &['7', '9', 'u', 'i'],
        '9' => &['8', '0', 'i', 'o'],
        '0' => &['9', 'o', 'p'],
        _ => return None,
    };
    Some(neighbors)
}

/// A neighbor of `c` chosen uniformly; keeps the case of an uppercase letter.
pub fn qwerty_adjacent_char<R: Rng + ?Sized>(c: char, rng: &mut R) -> Option<char> {
    let neighbors = qwerty_neighbors(c)?;
    let chosen = neighbors[rng.gen_range(0..neighbors.len())];
    Some(if c.is_ascii_uppercase() {
        chosen.to_ascii_uppercase()
    } else {
        chosen
    })
}

pub fn random_lowercase<R: Rng + ?Sized>(rng: &mut R) -> char {
    rng.gen_range(b'a'..=b'z') as char
}

/// The character typed by mistake in place of `intended`.
///
/// With `smart` set, a neighboring key is preferred; characters without a
/// neighbor table (and every character when `smart` is off) fall back to a
/// random lowercase letter.
pub fn decoy_char<R: Rng + ?Sized>(intended: char, smart: bool, rng: &mut R) -> char {
    if smart {
        if let Some(c) = qwerty_adjacent_char(intended, rng) {
            return c;
        }
    }
    random_lowercase(rng)
}
