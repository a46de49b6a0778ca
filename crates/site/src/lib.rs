//! The public MECHGENZ site, minus the markup: which image each section
//! shows and how the footer contact form behaves.

pub mod contact_form;
pub mod sections;
