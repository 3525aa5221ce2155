//! 登录 ID 与初始密码的生成
//!
//! 开户流程只依赖 [`IdGenerator`]，测试里换成 [`SequenceIdGenerator`] 即可得到确定的结果。

use std::collections::VecDeque;
use std::sync::Mutex;

use rand::Rng;

pub trait IdGenerator: Send + Sync {
    /// `t` + 6 位数字
    fn next_teacher_id(&self) -> String;
    /// 2 位年份 + 4 位数字
    fn next_student_id(&self, year: i32) -> String;
    /// `P` + 4 位数字 + 2 位年份
    fn next_parent_id(&self, year: i32) -> String;
    /// 6 位数字
    fn next_password(&self) -> String;
}

fn two_digit_year(year: i32) -> i32 {
    year.rem_euclid(100)
}

pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn next_teacher_id(&self) -> String {
        let n: u32 = rand::rng().random_range(100_000..1_000_000);
        format!("t{n}")
    }

    fn next_student_id(&self, year: i32) -> String {
        let n: u32 = rand::rng().random_range(1_000..10_000);
        format!("{:02}{n}", two_digit_year(year))
    }

    fn next_parent_id(&self, year: i32) -> String {
        let n: u32 = rand::rng().random_range(1_000..10_000);
        format!("P{n}{:02}", two_digit_year(year))
    }

    fn next_password(&self) -> String {
        let n: u32 = rand::rng().random_range(0..1_000_000);
        format!("{n:06}")
    }
}

/// 按预设序列依次返回，序列耗尽后回到随机生成
#[derive(Default)]
pub struct SequenceIdGenerator {
    ids: Mutex<VecDeque<String>>,
    passwords: Mutex<VecDeque<String>>,
}

impl SequenceIdGenerator {
    pub fn new<I, P>(ids: I, passwords: P) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self {
            ids: Mutex::new(ids.into_iter().map(Into::into).collect()),
            passwords: Mutex::new(passwords.into_iter().map(Into::into).collect()),
        }
    }

    fn pop(queue: &Mutex<VecDeque<String>>) -> Option<String> {
        match queue.lock() {
            Ok(mut guard) => guard.pop_front(),
            Err(poisoned) => poisoned.into_inner().pop_front(),
        }
    }
}

impl IdGenerator for SequenceIdGenerator {
    fn next_teacher_id(&self) -> String {
        Self::pop(&self.ids).unwrap_or_else(|| RandomIdGenerator.next_teacher_id())
    }

    fn next_student_id(&self, year: i32) -> String {
        Self::pop(&self.ids).unwrap_or_else(|| RandomIdGenerator.next_student_id(year))
    }

    fn next_parent_id(&self, year: i32) -> String {
        Self::pop(&self.ids).unwrap_or_else(|| RandomIdGenerator.next_parent_id(year))
    }

    fn next_password(&self) -> String {
        Self::pop(&self.passwords).unwrap_or_else(|| RandomIdGenerator.next_password())
    }
}
