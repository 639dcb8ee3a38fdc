mod session_flow_tests;
