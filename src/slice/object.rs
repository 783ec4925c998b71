//! Object container views.

use crate::slice::{ContainerInfo, Slice, SliceError, SliceResult};

/// A read-only view over an encoded object.
#[derive(Debug)]
pub struct ObjectSlice<'a> {
    slice: Slice<'a>,
    info: ContainerInfo,
}

impl<'a> ObjectSlice<'a> {
    #[inline]
    pub(crate) fn try_new(slice: Slice<'a>) -> SliceResult<ObjectSlice<'a>> {
        let info = slice.container_info()?;
        Ok(ObjectSlice { slice, info })
    }

    /// Number of key-value pairs. For unindexed objects this walks the whole
    /// container, so it is linear in the encoded size.
    #[inline]
    pub fn len(&self) -> SliceResult<usize> {
        match self.info.count {
            Some(count) => Ok(count),
            None => {
                let mut count = 0;
                for entry in self.iter() {
                    entry?;
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

    /// Looks up `key`, returning `None` if the object has no such key.
    ///
    /// Sorted objects are searched by binary search over the offset table;
    /// with duplicate keys the first stored occurrence wins. Unsorted and
    /// unindexed objects are scanned front to back, so the first occurrence
    /// wins there too. Only keys are decoded during the lookup.
    pub fn get(&self, key: &str) -> SliceResult<Option<Slice<'a>>> {
        let needle = key.as_bytes();
        match self.info.count {
            Some(count) if self.info.sorted => self.get_sorted(needle, count),
            Some(count) => {
                for index in 0..count {
                    let offset = self.slice.table_entry(&self.info, index)?;
                    let (key, value) = self.entry_bytes(offset)?;
                    if key == needle {
                        return Ok(Some(value));
                    }
                }
                Ok(None)
            }
            None => {
                let mut pos = self.info.members_start;
                while pos < self.info.members_end {
                    let (key, value) = self.entry_bytes(pos)?;
                    if key == needle {
                        return Ok(Some(value));
                    }
                    pos = self.advance(pos)?;
                }
                Ok(None)
            }
        }
    }

    /// Whether the object contains `key`.
    #[inline]
    pub fn has_key(&self, key: &str) -> SliceResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Returns the pair at `index`, in storage order.
    pub fn at(&self, index: usize) -> SliceResult<(&'a str, Slice<'a>)> {
        let offset = match self.info.count {
            Some(count) => {
                if index >= count {
                    return Err(SliceError::IndexOutOfBounds { len: count, index });
                }
                self.slice.table_entry(&self.info, index)?
            }
            None => {
                let mut pos = self.info.members_start;
                let mut walked = 0;
                while pos < self.info.members_end {
                    if walked == index {
                        break;
                    }
                    pos = self.advance(pos)?;
                    walked += 1;
                }
                if pos >= self.info.members_end {
                    return Err(SliceError::IndexOutOfBounds { len: walked, index });
                }
                pos
            }
        };
        self.entry(offset)
    }

    /// Iterates key-value pairs in storage order.
    #[inline]
    pub fn iter(&self) -> ObjectIter<'a> {
        ObjectIter { entries: self.entries() }
    }

    /// Iterates keys in storage order.
    #[inline]
    pub fn keys(&self) -> KeyIter<'a> {
        KeyIter { entries: self.entries() }
    }

    /// Iterates values in storage order.
    #[inline]
    pub fn values(&self) -> ValueIter<'a> {
        ValueIter { entries: self.entries() }
    }
}

impl<'a> ObjectSlice<'a> {
    #[inline]
    fn entries(&self) -> EntryIter<'a> {
        EntryIter {
            slice: self.slice,
            pos: self.info.members_start,
            end: self.info.members_end,
        }
    }

    /// Key and value slices of the pair starting at `offset`.
    #[inline]
    fn entry(&self, offset: usize) -> SliceResult<(&'a str, Slice<'a>)> {
        let key = self.slice.child_at(offset, self.info.members_end)?;
        let value = self.slice.child_at(offset + key.byte_size()?, self.info.members_end)?;
        Ok((key.as_str()?, value))
    }

    /// Raw key bytes and value slice of the pair starting at `offset`.
    #[inline]
    fn entry_bytes(&self, offset: usize) -> SliceResult<(&'a [u8], Slice<'a>)> {
        let key = self.slice.child_at(offset, self.info.members_end)?;
        let (key_bytes, _) = key.string_bytes()?;
        let value = self.slice.child_at(offset + key.byte_size()?, self.info.members_end)?;
        Ok((key_bytes, value))
    }

    /// Start of the pair following the pair at `pos`.
    #[inline]
    fn advance(&self, pos: usize) -> SliceResult<usize> {
        let key = self.slice.child_at(pos, self.info.members_end)?;
        let value_pos = pos + key.byte_size()?;
        let value = self.slice.child_at(value_pos, self.info.members_end)?;
        Ok(value_pos + value.byte_size()?)
    }

    /// Leftmost binary search over the key-sorted offset table.
    fn get_sorted(&self, needle: &[u8], count: usize) -> SliceResult<Option<Slice<'a>>> {
        let mut lo = 0;
        let mut hi = count;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let offset = self.slice.table_entry(&self.info, mid)?;
            let key = self.slice.child_at(offset, self.info.members_end)?;
            let (key_bytes, _) = key.string_bytes()?;
            if key_bytes < needle {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        if lo >= count {
            return Ok(None);
        }
        let offset = self.slice.table_entry(&self.info, lo)?;
        let (key_bytes, value) = self.entry_bytes(offset)?;
        if key_bytes == needle {
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }
}

/// Walks key-value pairs by their encoded sizes.
struct EntryIter<'a> {
    slice: Slice<'a>,
    pos: usize,
    end: usize,
}

impl<'a> EntryIter<'a> {
    fn next_pair(&mut self) -> Option<SliceResult<(Slice<'a>, Slice<'a>)>> {
        if self.pos >= self.end {
            return None;
        }
        let result = self.try_next_pair();
        if result.is_err() {
            self.pos = self.end;
        }
        Some(result)
    }

    fn try_next_pair(&mut self) -> SliceResult<(Slice<'a>, Slice<'a>)> {
        let key = self.slice.child_at(self.pos, self.end)?;
        let value_pos = self.pos + key.byte_size()?;
        let value = self.slice.child_at(value_pos, self.end)?;
        self.pos = value_pos + value.byte_size()?;
        Ok((key, value))
    }
}

/// An iterator over the key-value pairs of an object, in storage order.
pub struct ObjectIter<'a> {
    entries: EntryIter<'a>,
}

impl<'a> Iterator for ObjectIter<'a> {
    type Item = SliceResult<(&'a str, Slice<'a>)>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let pair = self.entries.next_pair()?;
        Some(pair.and_then(|(key, value)| Ok((key.as_str()?, value))))
    }
}

/// An iterator over the keys of an object, in storage order.
pub struct KeyIter<'a> {
    entries: EntryIter<'a>,
}

impl<'a> Iterator for KeyIter<'a> {
    type Item = SliceResult<&'a str>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let pair = self.entries.next_pair()?;
        Some(pair.and_then(|(key, _)| key.as_str()))
    }
}

/// An iterator over the values of an object, in storage order.
pub struct ValueIter<'a> {
    entries: EntryIter<'a>,
}

impl<'a> Iterator for ValueIter<'a> {
    type Item = SliceResult<Slice<'a>>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let pair = self.entries.next_pair()?;
        Some(pair.map(|(_, value)| value))
    }
}
