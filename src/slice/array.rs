//! Array container views.

use crate::slice::{ContainerInfo, Slice, SliceError, SliceResult};

/// A read-only view over an encoded array.
pub struct ArraySlice<'a> {
    slice: Slice<'a>,
    info: ContainerInfo,
}

impl<'a> ArraySlice<'a> {
    #[inline]
    pub(crate) fn try_new(slice: Slice<'a>) -> SliceResult<ArraySlice<'a>> {
        let info = slice.container_info()?;
        Ok(ArraySlice { slice, info })
    }

    /// Number of members. For unindexed arrays this walks the whole
    /// container, so it is linear in the encoded size.
    #[inline]
    pub fn len(&self) -> SliceResult<usize> {
        match self.info.count {
            Some(count) => Ok(count),
            None => {
                let mut count = 0;
                for member in self.iter() {
                    member?;
                    count += 1;
                }
                Ok(count)
            }
        }
    }

    #[inline]
    pub fn is_empty(&self) -> SliceResult<bool> {
        match self.info.count {
            Some(count) => Ok(count == 0),
            None => Ok(self.info.members_start >= self.info.members_end),
        }
    }

    /// Returns the member at `index`.
    ///
    /// Constant time for indexed arrays, linear for unindexed ones.
    pub fn at(&self, index: usize) -> SliceResult<Slice<'a>> {
        match self.info.count {
            Some(count) => {
                if index >= count {
                    return Err(SliceError::IndexOutOfBounds { len: count, index });
                }
                let offset = self.slice.table_entry(&self.info, index)?;
                self.slice.child_at(offset, self.info.members_end)
            }
            None => {
                let mut iter = self.iter();
                let mut remaining = index;
                for member in &mut iter {
                    let member = member?;
                    if remaining == 0 {
                        return Ok(member);
                    }
                    remaining -= 1;
                }
                Err(SliceError::IndexOutOfBounds {
                    len: index - remaining,
                    index,
                })
            }
        }
    }

    /// Iterates members in storage order.
    #[inline]
    pub fn iter(&self) -> ArrayIter<'a> {
        ArrayIter {
            slice: self.slice,
            pos: self.info.members_start,
            end: self.info.members_end,
        }
    }
}

/// An iterator over the members of an array, in storage order.
pub struct ArrayIter<'a> {
    slice: Slice<'a>,
    pos: usize,
    end: usize,
}

impl<'a> Iterator for ArrayIter<'a> {
    type Item = SliceResult<Slice<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.end {
            return None;
        }
        let member = match self.slice.child_at(self.pos, self.end) {
            Ok(member) => member,
            Err(e) => {
                self.pos = self.end;
                return Some(Err(e));
            }
        };
        match member.byte_size() {
            Ok(size) => {
                self.pos += size;
                Some(Ok(member))
            }
            Err(e) => {
                self.pos = self.end;
                Some(Err(e))
            }
        }
    }
}
