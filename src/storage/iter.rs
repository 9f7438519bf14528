use crate::datom::*;
use crate::storage::restricts::Restricts;

/// Filters a raw index scan down to the datoms that are currently asserted.
///
/// Index keys end with `[!tx][op]`, so all datoms about the same `[e a v]` fact are adjacent
/// and the newest one comes first. The fact is live iff that newest datom is an assertion.
pub struct LiveDatoms<I> {
    datoms: I,
    restricts: Restricts,
    last_fact: Option<(u64, u64, Value)>,
}

impl<I> LiveDatoms<I> {
    pub fn new(datoms: I, restricts: Restricts) -> Self {
        Self {
            datoms,
            restricts,
            last_fact: None,
        }
    }

    fn is_last_fact(&self, datom: &Datom) -> bool {
        match &self.last_fact {
            Some((entity, attribute, value)) => {
                *entity == datom.entity && *attribute == datom.attribute && *value == datom.value
            }
            None => false,
        }
    }
}

impl<E, I: Iterator<Item = Result<Datom, E>>> Iterator for LiveDatoms<I> {
    type Item = Result<Datom, E>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let datom = match self.datoms.next()? {
                Ok(datom) => datom,
                Err(err) => return Some(Err(err)),
            };
            if self.is_last_fact(&datom) {
                // Older history of a fact already decided
                continue;
            }
            self.last_fact = Some((datom.entity, datom.attribute, datom.value.clone()));
            if datom.op == Op::Assert && self.restricts.test(&datom) {
                return Some(Ok(datom));
            }
        }
    }
}
