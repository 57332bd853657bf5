use crate::common::BytesPerPixel;

mod paeth;

/// The byte level filter a PNG encoder applied to one scanline.
///
/// Filters operate on raw bytes of a scanline, not on pixels. Each filtered byte is predicted from
/// the reconstructed byte `bpp` positions to the left (`a`), the byte directly above (`b`) and the
/// byte above and to the left (`c`).
///
/// Details on how each filter works can be found in the [PNG Book](http://www.libpng.org/pub/png/book/chapter09.html).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FilterType {
    NoFilter = 0,
    Sub = 1,
    Up = 2,
    Avg = 3,
    Paeth = 4,
}

impl FilterType {
    /// u8 -> Self. Temporary solution until Rust provides a canonical one.
    pub fn from_u8(n: u8) -> Option<Self> {
        match n {
            0 => Some(Self::NoFilter),
            1 => Some(Self::Sub),
            2 => Some(Self::Up),
            3 => Some(Self::Avg),
            4 => Some(Self::Paeth),
            _ => None,
        }
    }
}

/// Reverses `filter` on `current` in place.
///
/// `previous` is the already reconstructed row above, or empty for the first row. Its length
/// otherwise equals the length of `current`.
pub(crate) fn unfilter(
    mut filter: FilterType,
    tbpp: BytesPerPixel,
    previous: &[u8],
    current: &mut [u8],
) {
    use self::FilterType::*;

    // If the previous row is empty, then treat it as if it were filled with zeros.
    if previous.is_empty() {
        if filter == Paeth {
            filter = Sub;
        } else if filter == Up {
            filter = NoFilter;
        }
    }

    match tbpp {
        BytesPerPixel::One => unfilter_bpp::<1>(filter, previous, current),
        BytesPerPixel::Two => unfilter_bpp::<2>(filter, previous, current),
        BytesPerPixel::Three => unfilter_bpp::<3>(filter, previous, current),
        BytesPerPixel::Four => unfilter_bpp::<4>(filter, previous, current),
        BytesPerPixel::Six => unfilter_bpp::<6>(filter, previous, current),
        BytesPerPixel::Eight => unfilter_bpp::<8>(filter, previous, current),
    }
}

fn unfilter_bpp<const BPP: usize>(filter: FilterType, previous: &[u8], current: &mut [u8]) {
    use self::FilterType::*;

    match filter {
        NoFilter => {}
        Sub => {
            let mut left = [0u8; BPP];
            for chunk in current.chunks_exact_mut(BPP) {
                for i in 0..BPP {
                    chunk[i] = chunk[i].wrapping_add(left[i]);
                }
                left.copy_from_slice(chunk);
            }
        }
        Up => {
            for (curr, &above) in current.iter_mut().zip(previous) {
                *curr = curr.wrapping_add(above);
            }
        }
        Avg if previous.is_empty() => {
            let mut left = [0u8; BPP];
            for chunk in current.chunks_exact_mut(BPP) {
                for i in 0..BPP {
                    chunk[i] = chunk[i].wrapping_add(left[i] / 2);
                }
                left.copy_from_slice(chunk);
            }
        }
        Avg => {
            let mut left = [0u8; BPP];
            for (chunk, above) in current
                .chunks_exact_mut(BPP)
                .zip(previous.chunks_exact(BPP))
            {
                for i in 0..BPP {
                    let avg = (u16::from(above[i]) + u16::from(left[i])) / 2;
                    chunk[i] = chunk[i].wrapping_add(avg as u8);
                }
                left.copy_from_slice(chunk);
            }
        }
        Paeth => paeth::unfilter::<BPP>(previous, current),
    }
}
