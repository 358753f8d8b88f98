// Calendar source for date-dependent widgets
use chrono::NaiveDate;

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

#[cfg(test)]
impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
