// ABOUTME: MCP prompt resources describing the consultation workflow to the client agent
// ABOUTME: Served as the server instructions, the get_workflow_guide tool and a named prompt

pub const WORKFLOW_GUIDE: &str = include_str!("workflow_guide.md");

pub const WORKFLOW_GUIDE_PROMPT_NAME: &str = "offeri_workflow_guide";
