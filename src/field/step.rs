use super::ScalarField;

/// Advances a field by one discrete time unit.
pub trait FieldStepper {
    fn step(&mut self, field: &mut ScalarField);
}

/// Leaves the field unchanged. No solver is implemented yet.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stationary;

impl FieldStepper for Stationary {
    fn step(&mut self, _field: &mut ScalarField) {
        // empty
    }
}
