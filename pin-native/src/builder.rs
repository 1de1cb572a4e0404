//! IR Builder
//!
//! Provides utilities for constructing native IR programmatically. The
//! host pipeline and the test suites use it to assemble modules.

use pin_common::{LabelId, SourceLocation, TempId};
use crate::{BasicBlock, Function, Instruction, IrBinaryOp, IrType, IrUnaryOp, Value};

/// Builder for constructing native IR one function at a time
pub struct IrBuilder {
    current_function: Option<Function>,
    current_block: Option<LabelId>,
    next_temp_id: TempId,
    next_label_id: LabelId,
}

impl IrBuilder {
    pub fn new() -> Self {
        Self {
            current_function: None,
            current_block: None,
            next_temp_id: 0,
            next_label_id: 0,
        }
    }

    pub fn new_temp(&mut self) -> TempId {
        let temp = self.next_temp_id;
        self.next_temp_id += 1;
        temp
    }

    pub fn new_label(&mut self) -> LabelId {
        let label = self.next_label_id;
        self.next_label_id += 1;
        label
    }

    pub fn create_function(&mut self, name: &str, return_type: IrType) -> &mut Function {
        // Temps and labels are numbered per function
        self.next_temp_id = 0;
        self.next_label_id = 0;
        self.current_block = None;
        self.current_function.insert(Function::new(name.to_string(), return_type))
    }

    /// Add a parameter and return the temp that names it
    pub fn add_parameter(&mut self, param_type: IrType) -> Result<TempId, String> {
        let param_id = self.new_temp();
        let function = self.current_function.as_mut().ok_or("No current function")?;
        function.add_parameter(param_id, param_type);
        Ok(param_id)
    }

    /// Append a new block and make it current
    pub fn create_block(&mut self) -> Result<LabelId, String> {
        let label_id = self.new_label();
        let function = self.current_function.as_mut().ok_or("No current function")?;
        function.add_block(BasicBlock::new(label_id));
        self.current_block = Some(label_id);
        Ok(label_id)
    }

    pub fn switch_to_block(&mut self, label_id: LabelId) -> Result<(), String> {
        let function = self.current_function.as_ref().ok_or("No current function")?;
        if function.get_block(label_id).is_none() {
            return Err(format!("Block L{label_id} not found in '{}'", function.name));
        }
        self.current_block = Some(label_id);
        Ok(())
    }

    pub fn build_binary(
        &mut self,
        op: IrBinaryOp,
        lhs: Value,
        rhs: Value,
        result_type: IrType,
    ) -> Result<TempId, String> {
        let result = self.new_temp();
        self.add_instruction(Instruction::Binary { result, op, lhs, rhs, result_type })?;
        Ok(result)
    }

    pub fn build_unary(
        &mut self,
        op: IrUnaryOp,
        operand: Value,
        result_type: IrType,
    ) -> Result<TempId, String> {
        let result = self.new_temp();
        self.add_instruction(Instruction::Unary { result, op, operand, result_type })?;
        Ok(result)
    }

    pub fn build_load(&mut self, ptr: Value, result_type: IrType) -> Result<TempId, String> {
        let result = self.new_temp();
        self.add_instruction(Instruction::Load { result, ptr, result_type })?;
        Ok(result)
    }

    pub fn build_store(&mut self, value: Value, ptr: Value) -> Result<(), String> {
        self.add_instruction(Instruction::Store { value, ptr })
    }

    pub fn build_alloca(
        &mut self,
        alloc_type: IrType,
        count: Option<Value>,
    ) -> Result<TempId, String> {
        let result = self.new_temp();
        let result_type = IrType::Ptr(Box::new(alloc_type.clone()));
        self.add_instruction(Instruction::Alloca { result, alloc_type, count, result_type })?;
        Ok(result)
    }

    pub fn build_gep(
        &mut self,
        ptr: Value,
        indices: Vec<Value>,
        result_type: IrType,
    ) -> Result<TempId, String> {
        let result = self.new_temp();
        self.add_instruction(Instruction::GetElementPtr { result, ptr, indices, result_type })?;
        Ok(result)
    }

    pub fn build_call(
        &mut self,
        function: Value,
        args: Vec<Value>,
        result_type: IrType,
    ) -> Result<Option<TempId>, String> {
        let result = if matches!(result_type, IrType::Void) {
            None
        } else {
            Some(self.new_temp())
        };

        self.add_instruction(Instruction::Call {
            result,
            function,
            args,
            result_type,
            known_inlined: false,
        })?;
        Ok(result)
    }

    pub fn build_intrinsic(
        &mut self,
        intrinsic: &str,
        args: Vec<Value>,
        result_type: IrType,
    ) -> Result<Option<TempId>, String> {
        let result = if matches!(result_type, IrType::Void) {
            None
        } else {
            Some(self.new_temp())
        };
        self.add_instruction(Instruction::Intrinsic {
            result,
            intrinsic: intrinsic.to_string(),
            args,
            result_type,
        })?;
        Ok(result)
    }

    pub fn build_cast(&mut self, value: Value, target_type: IrType) -> Result<TempId, String> {
        let result = self.new_temp();
        self.add_instruction(Instruction::Cast { result, value, target_type })?;
        Ok(result)
    }

    pub fn build_select(
        &mut self,
        condition: Value,
        true_value: Value,
        false_value: Value,
        result_type: IrType,
    ) -> Result<TempId, String> {
        let result = self.new_temp();
        self.add_instruction(Instruction::Select {
            result,
            condition,
            true_value,
            false_value,
            result_type,
        })?;
        Ok(result)
    }

    pub fn build_phi(
        &mut self,
        incoming: Vec<(Value, LabelId)>,
        result_type: IrType,
    ) -> Result<TempId, String> {
        let result = self.new_temp();
        self.add_instruction(Instruction::Phi { result, incoming, result_type })?;
        Ok(result)
    }

    pub fn build_return(&mut self, value: Option<Value>) -> Result<(), String> {
        self.add_instruction(Instruction::Return(value))
    }

    pub fn build_branch(&mut self, label: LabelId) -> Result<(), String> {
        self.add_instruction(Instruction::Branch(label))
    }

    pub fn build_branch_cond(
        &mut self,
        condition: Value,
        true_label: LabelId,
        false_label: LabelId,
    ) -> Result<(), String> {
        self.add_instruction(Instruction::BranchCond { condition, true_label, false_label })
    }

    pub fn build_debug_loc(&mut self, location: SourceLocation) -> Result<(), String> {
        self.add_instruction(Instruction::DebugLoc { location })
    }

    pub fn build_comment(&mut self, text: &str) -> Result<(), String> {
        self.add_instruction(Instruction::Comment(text.to_string()))
    }

    pub fn build_inline_asm(&mut self, assembly: &str) -> Result<(), String> {
        self.add_instruction(Instruction::InlineAsm {
            assembly: assembly.to_string(),
            outputs: Vec::new(),
            inputs: Vec::new(),
            clobbers: Vec::new(),
        })
    }

    fn add_instruction(&mut self, instr: Instruction) -> Result<(), String> {
        let function = self.current_function.as_mut().ok_or("No current function")?;
        let block_id = self.current_block.ok_or("No current block")?;
        let block = function
            .get_block_mut(block_id)
            .ok_or_else(|| "Current block not found".to_string())?;
        block.add_instruction(instr);
        Ok(())
    }

    pub fn current_block_has_terminator(&self) -> bool {
        match (&self.current_function, self.current_block) {
            (Some(function), Some(block_id)) => {
                function.get_block(block_id).is_some_and(BasicBlock::has_terminator)
            }
            _ => false,
        }
    }

    /// Finish the current function, filling in its CFG edges
    pub fn finish_function(&mut self) -> Option<Function> {
        self.current_block = None;
        let mut function = self.current_function.take()?;
        function.recompute_cfg();
        Some(function)
    }
}

impl Default for IrBuilder {
    fn default() -> Self {
        Self::new()
    }
}
