use crate::string_obj::resolve_index;
use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// A mutable, ordered sequence of values.
///
/// Backed by `Rc<RefCell<Vec<Value>>>`: the `Rc` gives the refcounted-clone
/// contract of `SPEC_FULL.md` §3 (cloning an array value shares the backing
/// storage, exactly like the original's pointer-plus-refcount array), and
/// the `RefCell` is needed because `index_assign`/`push`/`delete`/`insert`
/// mutate through a shared handle — an array value held in two local slots
/// simultaneously (e.g. after a `MOVE`) must observe each other's writes,
/// matching the original's single-owner-pointer semantics.
#[derive(Debug, Clone)]
pub struct ScriptArray(Rc<RefCell<Vec<Value>>>);

impl ScriptArray {
    pub fn new() -> Self {
        ScriptArray(Rc::new(RefCell::new(Vec::new())))
    }

    pub fn from_values(values: Vec<Value>) -> Self {
        ScriptArray(Rc::new(RefCell::new(values)))
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn push(&self, value: Value) {
        self.0.borrow_mut().push(value);
    }

    /// Clone every element into a fresh, independently-owned array — the
    /// "deep enough" clone the original's `clone_array` performs (bumping
    /// each element's own refcount, not aliasing the backing buffer).
    pub fn deep_clone(&self) -> ScriptArray {
        let values = self.0.borrow().clone();
        ScriptArray::from_values(values)
    }

    pub fn get(&self, idx: i64) -> Option<Value> {
        let values = self.0.borrow();
        let resolved = resolve_index(idx, values.len())?;
        Some(values[resolved].clone())
    }

    /// `index_assign`: negative indices resolve as `length + i`; an index at
    /// or beyond the current length extends the array with nulls up to and
    /// including that position. Returns `false` only when the resolved
    /// index is still negative (assigning to an index further negative than
    /// `-length`).
    pub fn index_assign(&self, idx: i64, value: Value) -> bool {
        let mut values = self.0.borrow_mut();
        let resolved = if idx < 0 { idx + values.len() as i64 } else { idx };
        if resolved < 0 {
            return false;
        }
        let resolved = resolved as usize;
        while values.len() <= resolved {
            values.push(Value::Null);
        }
        values[resolved] = value;
        true
    }

    /// Remove and return the element at a possibly-negative index, shifting
    /// subsequent elements left. `None` for out of bounds (mapped to
    /// script-level `null` by the `delete` built-in).
    pub fn delete(&self, idx: i64) -> Option<Value> {
        let mut values = self.0.borrow_mut();
        let resolved = resolve_index(idx, values.len())?;
        Some(values.remove(resolved))
    }

    /// Insert a value at a possibly-negative index, shifting subsequent
    /// elements right. An index at or beyond the array's length behaves
    /// like `index_assign` (extends with nulls). Returns `false` only when
    /// the resolved index is still negative.
    pub fn insert(&self, idx: i64, value: Value) -> bool {
        let len = self.len();
        let resolved = if idx < 0 { idx + len as i64 } else { idx };
        if resolved < 0 {
            return false;
        }
        let resolved = resolved as usize;
        if resolved >= len {
            return self.index_assign(resolved as i64, value);
        }
        self.0.borrow_mut().insert(resolved, value);
        true
    }

    pub fn concat(&self, other: &ScriptArray) -> ScriptArray {
        let mut values = self.0.borrow().clone();
        values.extend(other.0.borrow().iter().cloned());
        ScriptArray::from_values(values)
    }

    /// Replicate `amnt` times; `amnt == 1` returns a deep clone, matching
    /// `replicate_array`'s short-circuit.
    pub fn replicate(&self, amnt: u64) -> ScriptArray {
        if amnt == 1 {
            return self.deep_clone();
        }
        let source = self.0.borrow();
        let mut values = Vec::with_capacity(source.len() * amnt as usize);
        for _ in 0..amnt {
            values.extend(source.iter().cloned());
        }
        ScriptArray::from_values(values)
    }

    /// Lexicographic comparison: the first index where elements differ
    /// decides; if one array is a prefix of the other, the shorter one is
    /// smaller.
    pub fn compare(&self, other: &ScriptArray) -> Result<std::cmp::Ordering, crate::RuntimeError> {
        let lhs = self.0.borrow();
        let rhs = other.0.borrow();
        let min_len = lhs.len().min(rhs.len());
        for i in 0..min_len {
            let cmp = crate::ops::compare_values(&lhs[i], &rhs[i])?;
            if cmp != std::cmp::Ordering::Equal {
                return Ok(cmp);
            }
        }
        Ok(lhs.len().cmp(&rhs.len()))
    }

    pub fn equal(&self, other: &ScriptArray) -> bool {
        let lhs = self.0.borrow();
        let rhs = other.0.borrow();
        lhs.len() == rhs.len()
            && lhs
                .iter()
                .zip(rhs.iter())
                .all(|(a, b)| crate::ops::equal_values(a, b))
    }

    pub fn to_script_string(&self) -> String {
        let values = self.0.borrow();
        if values.is_empty() {
            return "[]".to_string();
        }
        let mut out = String::from("[");
        for (i, value) in values.iter().enumerate() {
            if i != 0 {
                out.push_str(", ");
            }
            out.push_str(&crate::ops::inspect_value(value));
        }
        out.push(']');
        out
    }

    pub fn debug_dump(&self) -> String {
        let values = self.0.borrow();
        let mut out = String::from("Array(");
        for (i, value) in values.iter().enumerate() {
            if i != 0 {
                out.push_str(", ");
            }
            out.push_str(&value.debug_dump());
        }
        out.push(')');
        out
    }
}

impl Default for ScriptArray {
    fn default() -> Self {
        ScriptArray::new()
    }
}

impl PartialEq for ScriptArray {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0) || self.equal(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_assign_extends_with_nulls() {
        let a = ScriptArray::new();
        assert!(a.index_assign(3, Value::Number(9)));
        assert_eq!(a.len(), 4);
        assert_eq!(a.get(0), Some(Value::Null));
        assert_eq!(a.get(1), Some(Value::Null));
        assert_eq!(a.get(2), Some(Value::Null));
        assert_eq!(a.get(3), Some(Value::Number(9)));
    }

    #[test]
    fn negative_index_assign_out_of_range_fails() {
        let a = ScriptArray::from_values(vec![Value::Number(1)]);
        assert!(!a.index_assign(-5, Value::Number(0)));
    }

    #[test]
    fn delete_shifts_left() {
        let a = ScriptArray::from_values(vec![
            Value::Number(1),
            Value::Number(2),
            Value::Number(3),
        ]);
        assert_eq!(a.delete(1), Some(Value::Number(2)));
        assert_eq!(a.len(), 2);
        assert_eq!(a.get(1), Some(Value::Number(3)));
    }

    #[test]
    fn insert_at_end_extends() {
        let a = ScriptArray::new();
        assert!(a.insert(2, Value::Number(7)));
        assert_eq!(a.len(), 3);
        assert_eq!(a.get(2), Some(Value::Number(7)));
    }

    #[test]
    fn clone_is_shared_handle_but_deep_clone_is_independent() {
        let a = ScriptArray::from_values(vec![Value::Number(1)]);
        let shared = a.clone();
        shared.push(Value::Number(2));
        assert_eq!(a.len(), 2); // shared backing storage

        let deep = a.deep_clone();
        deep.push(Value::Number(3));
        assert_eq!(a.len(), 2); // independent backing storage
    }

    #[test]
    fn to_script_string_of_empty_array() {
        assert_eq!(ScriptArray::new().to_script_string(), "[]");
    }
}
