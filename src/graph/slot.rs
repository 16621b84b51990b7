//! Single-occupant ownership of disposable resources.

use super::layout::ForceSimulation;

/// Something holding a render surface or scheduled work that must be released
/// explicitly before it is dropped or replaced.
pub trait Dispose {
	/// Releases whatever the instance holds. Called at most once per slot entry.
	fn dispose(&mut self);
}

impl Dispose for ForceSimulation {
	fn dispose(&mut self) {
		self.stop();
	}
}

/// Owns at most one live instance. Installing a new one disposes the previous first, so
/// two instances never share the slot's surface.
pub struct Slot<T: Dispose> {
	current: Option<T>,
}

impl<T: Dispose> Default for Slot<T> {
	fn default() -> Self {
		Self { current: None }
	}
}

impl<T: Dispose> Slot<T> {
	/// An empty slot.
	pub fn new() -> Self {
		Self::default()
	}

	/// Disposes the current instance, if any, then installs `next`.
	pub fn replace(&mut self, next: T) -> &mut T {
		self.clear();
		self.current.insert(next)
	}

	/// Disposes and drops the current instance, if any.
	pub fn clear(&mut self) {
		if let Some(mut previous) = self.current.take() {
			previous.dispose();
		}
	}

	/// The live instance, if any.
	pub fn get(&self) -> Option<&T> {
		self.current.as_ref()
	}

	/// The live instance, if any.
	pub fn get_mut(&mut self) -> Option<&mut T> {
		self.current.as_mut()
	}

	/// Whether an instance is installed.
	pub fn is_occupied(&self) -> bool {
		self.current.is_some()
	}
}

impl<T: Dispose> Drop for Slot<T> {
	fn drop(&mut self) {
		self.clear();
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::rc::Rc;

	use super::*;

	struct Surface {
		name: &'static str,
		log: Rc<RefCell<Vec<&'static str>>>,
	}

	impl Dispose for Surface {
		fn dispose(&mut self) {
			self.log.borrow_mut().push(self.name);
		}
	}

	#[test]
	fn replace_disposes_the_previous_instance_first() {
		let log = Rc::new(RefCell::new(Vec::new()));
		let mut slot = Slot::new();
		slot.replace(Surface {
			name: "first",
			log: log.clone(),
		});
		assert!(log.borrow().is_empty());

		let current = slot.replace(Surface {
			name: "second",
			log: log.clone(),
		});
		assert_eq!(current.name, "second");
		assert_eq!(*log.borrow(), vec!["first"]);
	}

	#[test]
	fn dropping_the_slot_disposes_what_it_holds() {
		let log = Rc::new(RefCell::new(Vec::new()));
		{
			let mut slot = Slot::new();
			slot.replace(Surface {
				name: "only",
				log: log.clone(),
			});
		}
		assert_eq!(*log.borrow(), vec!["only"]);
	}

	#[test]
	fn clear_is_idempotent() {
		let log = Rc::new(RefCell::new(Vec::new()));
		let mut slot = Slot::new();
		slot.replace(Surface {
			name: "a",
			log: log.clone(),
		});
		slot.clear();
		slot.clear();
		assert!(!slot.is_occupied());
		assert_eq!(log.borrow().len(), 1);
	}
}
