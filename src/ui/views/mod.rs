pub mod patients;
pub mod visits;

pub use patients::draw_patient_list;
pub use visits::draw_visit_panel;
