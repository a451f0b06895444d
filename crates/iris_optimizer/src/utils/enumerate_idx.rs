/// `enumerate` yielding a typed index newtype instead of a bare `usize`.
pub trait EnumerateIdx: Iterator + Sized {
    fn enumerate_idx<Idx: From<usize>>(self) -> impl Iterator<Item = (Idx, Self::Item)> {
        self.enumerate()
            .map(|(index, item)| (Idx::from(index), item))
    }
}

impl<I: Iterator> EnumerateIdx for I {}
