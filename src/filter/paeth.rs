/// The Paeth predictor as defined by the PNG specification.
///
/// Ties go to `a`, then `b`, then `c`.
pub(crate) fn filter_paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = i16::from(a) + i16::from(b) - i16::from(c);
    let pa = (p - i16::from(a)).abs();
    let pb = (p - i16::from(b)).abs();
    let pc = (p - i16::from(c)).abs();

    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

/// Reverses the Paeth filter for a row with a non-empty previous row.
pub(super) fn unfilter<const BPP: usize>(previous: &[u8], current: &mut [u8]) {
    // Paeth filter pixels:
    // C B D
    // A X
    let mut a_bpp = [0u8; BPP];
    let mut c_bpp = [0u8; BPP];
    for (chunk, b_bpp) in current
        .chunks_exact_mut(BPP)
        .zip(previous.chunks_exact(BPP))
    {
        for i in 0..BPP {
            chunk[i] = chunk[i].wrapping_add(filter_paeth(a_bpp[i], b_bpp[i], c_bpp[i]));
        }
        a_bpp.copy_from_slice(chunk);
        c_bpp.copy_from_slice(b_bpp);
    }
}
