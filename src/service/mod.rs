pub mod elections;
pub mod municipality;
pub mod officials;
