use crate::text::{clean_code_text, detect_repl_code};
use crate::types::{Block, BlockType};

/// Line prefixes that mark a line as source rather than interpreter output.
const CODE_LINE_PREFIXES: &[&str] = &[
    ">>>", "import", "def ", "class ", "for ", "while ", "if ", "print", "from ", "with ", "#",
    "return", "try:", "async ", "@",
];

/// Shortest snippet worth offering as runnable code.
const MIN_RUNNABLE_CHARS: usize = 10;

/// Merges code regions that the classifier split (across pages or around
/// leaked furniture) and assigns stable block identifiers.
#[derive(Debug, Default)]
pub struct CodeConsolidator;

impl CodeConsolidator {
    pub fn new() -> Self {
        CodeConsolidator
    }

    /// Merge runs of consecutive code blocks, then number code and heading
    /// blocks in document order.
    pub fn process(&self, blocks: Vec<Block>) -> Vec<Block> {
        let before = blocks.len();
        let mut merged = merge_adjacent_code(blocks);
        assign_block_ids(&mut merged);
        log::debug!("Code consolidation: {} -> {} blocks", before, merged.len());
        merged
    }

    /// Code blocks that look like complete, executable snippets rather than
    /// inline references or bare interpreter output.
    pub fn extract_runnable_code<'b>(&self, blocks: &'b [Block]) -> Vec<&'b Block> {
        blocks
            .iter()
            .filter(|b| b.block_type.is_code())
            .filter(|b| {
                let text = b.text.trim();
                text.chars().count() >= MIN_RUNNABLE_CHARS
                    && text.contains('\n')
                    && text.lines().any(|line| {
                        let line = line.trim_start();
                        CODE_LINE_PREFIXES.iter().any(|p| line.starts_with(p))
                    })
            })
            .collect()
    }
}

fn merge_adjacent_code(blocks: Vec<Block>) -> Vec<Block> {
    let mut result: Vec<Block> = Vec::with_capacity(blocks.len());
    let mut run: Vec<Block> = Vec::new();

    for block in blocks {
        if block.block_type.is_code() {
            run.push(block);
            continue;
        }
        if !run.is_empty() {
            result.push(merge_code_run(std::mem::take(&mut run)));
        }
        result.push(block);
    }
    if !run.is_empty() {
        result.push(merge_code_run(run));
    }
    result
}

fn merge_code_run(run: Vec<Block>) -> Block {
    let text = clean_code_text(
        &run.iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
    );
    let block_type = if detect_repl_code(&text) {
        BlockType::CodeRepl
    } else {
        BlockType::Code
    };

    let mut blocks = run.into_iter();
    // Callers only build non-empty runs.
    let mut first = blocks.next().unwrap_or_else(|| Block::new(BlockType::Code, "", 0));
    first.block_type = block_type;
    first.text = text;
    first.is_monospace = true;
    first.is_bold = false;
    first.block_id.clear();
    first
}

fn assign_block_ids(blocks: &mut [Block]) {
    let mut code_index = 0;
    let mut heading_index = 0;
    for block in blocks.iter_mut() {
        if block.block_type.is_code() {
            block.block_id = format!("code_{code_index}");
            code_index += 1;
        } else if block.block_type.is_heading() {
            block.block_id = format!("heading_{heading_index}");
            heading_index += 1;
        } else {
            block.block_id.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_block(block_type: BlockType, text: &str, page: usize) -> Block {
        Block::new(block_type, text, page)
    }

    #[test]
    fn test_merge_adjacent_code() {
        let blocks = vec![
            make_block(BlockType::Code, "x=1", 3),
            make_block(BlockType::Code, "y=2", 4),
            make_block(BlockType::Body, "text", 4),
            make_block(BlockType::Code, "z=3", 4),
        ];
        let out = CodeConsolidator::new().process(blocks);
        let code: Vec<&Block> = out.iter().filter(|b| b.block_type.is_code()).collect();
        assert_eq!(code.len(), 2);
        assert_eq!(code[0].text, "x=1\ny=2");
        assert_eq!(code[0].block_id, "code_0");
        assert_eq!(code[0].page_num, 3);
        assert_eq!(code[1].text, "z=3");
        assert_eq!(code[1].block_id, "code_1");
        assert_eq!(out[1].block_type, BlockType::Body);
        assert!(out[1].block_id.is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(CodeConsolidator::new().process(Vec::new()).is_empty());
    }

    #[test]
    fn test_heading_ids_are_sequential() {
        let blocks = vec![
            make_block(BlockType::Heading1, "One", 0),
            make_block(BlockType::Body, "a", 0),
            make_block(BlockType::Heading2, "Two", 0),
            make_block(BlockType::Code, "x = 1", 0),
            make_block(BlockType::Heading3, "Three", 1),
        ];
        let out = CodeConsolidator::new().process(blocks);
        let ids: Vec<&str> = out.iter().map(|b| b.block_id.as_str()).collect();
        assert_eq!(ids, vec!["heading_0", "", "heading_1", "code_0", "heading_2"]);
    }

    #[test]
    fn test_merged_repl_is_retagged() {
        let blocks = vec![
            make_block(BlockType::Code, ">>> x = 1", 0),
            make_block(BlockType::Code, ">>> x", 0),
            make_block(BlockType::Code, "1", 1),
        ];
        let out = CodeConsolidator::new().process(blocks);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].block_type, BlockType::CodeRepl);
    }

    #[test]
    fn test_merged_type_follows_text() {
        // A REPL fragment diluted by plain code drops below the prompt ratio.
        let blocks = vec![
            make_block(BlockType::CodeRepl, ">>> f()", 0),
            make_block(BlockType::Code, "def f():\n    a = 1\n    b = 2\n    return a + b", 0),
        ];
        let out = CodeConsolidator::new().process(blocks);
        assert_eq!(out[0].block_type, BlockType::Code);
    }

    #[test]
    fn test_merge_strips_leaked_furniture() {
        let blocks = vec![
            make_block(BlockType::Code, "for i in range(3):", 10),
            make_block(BlockType::Code, "57", 10),
            make_block(BlockType::Code, "Chapter 3: Loops\n    print(i)", 11),
        ];
        let out = CodeConsolidator::new().process(blocks);
        assert_eq!(out[0].text, "for i in range(3):\n    print(i)");
        assert!(out[0].is_monospace);
    }

    #[test]
    fn test_extract_runnable_code() {
        let blocks = vec![
            make_block(BlockType::Code, "x", 0),
            make_block(BlockType::Code, "import os\nos.getcwd()", 0),
            make_block(BlockType::Code, "42\n43\n44 45 46", 0),
            make_block(BlockType::Body, "def f():\n    pass", 0),
            make_block(BlockType::CodeRepl, ">>> 1 + 1\n2", 0),
            make_block(BlockType::Code, "long_single_line_expression()", 0),
        ];
        let c = CodeConsolidator::new();
        let runnable = c.extract_runnable_code(&blocks);
        let texts: Vec<&str> = runnable.iter().map(|b| b.text.as_str()).collect();
        assert_eq!(texts, vec!["import os\nos.getcwd()", ">>> 1 + 1\n2"]);
    }
}
