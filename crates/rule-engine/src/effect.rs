//! 效果执行器
//!
//! 对单条记录执行规则效果。所有修改都作用在深拷贝上，调用方的原记录始终不变；
//! 省略类动作不产生记录，只返回一个标记。

use crate::error::{Result, RuleError};
use crate::evaluator::type_name;
use crate::models::{Effect, EffectOutcome, Record};
use crate::operators::Action;
use crate::resolver::FieldResolver;
use serde_json::{Number, Value};
use tracing::debug;

/// 效果执行器
#[derive(Debug, Clone, Default)]
pub struct EffectExecutor {
    resolver: FieldResolver,
}

impl EffectExecutor {
    pub fn new(resolver: FieldResolver) -> Self {
        Self { resolver }
    }

    /// 执行效果
    ///
    /// `target` 通常是单条记录；省略类动作也接受记录数组。
    pub fn run(&self, target: &Value, effect: &Effect) -> Result<EffectOutcome> {
        let action: Action = effect.action.parse()?;

        match action {
            Action::Increment | Action::Decrement => {
                Self::require_record(target, action)?;
                let updated = self.perform_arithmetic(target.clone(), action, effect)?;
                Ok(EffectOutcome::Updated(updated))
            }
            Action::Add | Action::Replace => {
                let property = Self::require_property(effect, action)?;
                let value = effect
                    .value
                    .clone()
                    .ok_or(RuleError::MissingEffectValue(action))?;
                Self::require_record(target, action)?;

                debug!(%action, property, "writing effect value");
                let updated = self.resolver.write(property, value, target.clone())?;
                Ok(EffectOutcome::Updated(updated))
            }
            Action::Omit => Ok(EffectOutcome::Omit),
            Action::OmitWithSilentError => {
                let error = effect.error.clone().ok_or(RuleError::MissingEffectError)?;
                Ok(EffectOutcome::OmitWithSilentError(error))
            }
        }
    }

    /// 对记录执行加减运算并写回
    ///
    /// 当前值必须是数值，`effect.value` 必须是整数。整数相加做溢出检查，
    /// 当前值为浮点数时按浮点运算。
    pub fn perform_arithmetic(
        &self,
        record: Record,
        action: Action,
        effect: &Effect,
    ) -> Result<Record> {
        if !matches!(action, Action::Increment | Action::Decrement) {
            return Err(RuleError::InvalidEffectAction(action));
        }

        let property = Self::require_property(effect, action)?;
        let current = self.resolver.resolve(property, &record, None)?;

        let current = match current {
            Value::Number(n) => n.clone(),
            other => {
                return Err(RuleError::ArithmeticTypeError {
                    action,
                    reason: format!("{} 的当前值是 {}, 不是数值", property, type_name(other)),
                });
            }
        };

        let operand = Self::integer_operand(effect, action, &current)?;

        let next = Self::apply_operand(&current, operand, action)?;
        debug!(%action, property, %current, %next, "arithmetic effect applied");

        self.resolver.write(property, Value::Number(next), record)
    }

    fn apply_operand(current: &Number, operand: i64, action: Action) -> Result<Number> {
        if let Some(current) = current.as_i64() {
            let next = match action {
                Action::Decrement => current.checked_sub(operand),
                _ => current.checked_add(operand),
            };
            return next
                .map(Number::from)
                .ok_or(RuleError::ArithmeticOverflow {
                    action,
                    current: Number::from(current),
                    operand: Number::from(operand),
                });
        }

        let current = current.as_f64().unwrap_or(f64::NAN);
        let next = match action {
            Action::Decrement => current - operand as f64,
            _ => current + operand as f64,
        };

        Number::from_f64(next).ok_or_else(|| RuleError::ArithmeticTypeError {
            action,
            reason: format!("结果 {} 不是有限数值", next),
        })
    }

    /// 整数操作数；`8.0` 这类没有小数部分的浮点数也视为整数，超出 i64 范围时报溢出
    fn integer_operand(effect: &Effect, action: Action, current: &Number) -> Result<i64> {
        let not_integer = || RuleError::ArithmeticTypeError {
            action,
            reason: "effect.value 缺失或不是整数".to_string(),
        };
        let Some(Value::Number(n)) = effect.value.as_ref() else {
            return Err(not_integer());
        };
        if let Some(i) = n.as_i64() {
            return Ok(i);
        }

        let overflow = || RuleError::ArithmeticOverflow {
            action,
            current: current.clone(),
            operand: n.clone(),
        };
        if n.as_u64().is_some() {
            return Err(overflow());
        }

        let f = n.as_f64().ok_or_else(not_integer)?;
        if f.fract() != 0.0 {
            return Err(not_integer());
        }
        // i64::MAX as f64 恰好是 2^63，本身已越界
        if f >= i64::MIN as f64 && f < i64::MAX as f64 {
            Ok(f as i64)
        } else {
            Err(overflow())
        }
    }

    fn require_property(effect: &Effect, action: Action) -> Result<&str> {
        effect
            .property
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or(RuleError::InvalidEffectProperty(action))
    }

    fn require_record(target: &Value, action: Action) -> Result<()> {
        if target.is_object() {
            Ok(())
        } else {
            Err(RuleError::InvalidEffectTarget {
                action,
                actual: type_name(target).to_string(),
            })
        }
    }
}
